//! `tracelot activity ...`

use std::collections::BTreeMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use trace::{NewActivity, NewProductLot, TraceService};
use tracelot_core::{new_id, ServiceError};

use super::{print_json, print_message};

#[derive(Subcommand, Debug)]
pub enum ActivityAction {
    /// Consume input lots and produce a new lot.
    Create(ActivityArgs),

    /// Show an activity by id.
    Get { id: String },

    /// List every activity.
    List,
}

#[derive(Args, Debug, Clone)]
pub struct ActivityArgs {
    /// Activity id (generated if omitted).
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long, default_value = "")]
    pub designation: String,

    /// Operator recorded on the activity.
    #[arg(long = "user")]
    pub user_id: String,

    /// Consumed lot as ID=QTY; repeatable.
    #[arg(long = "input", value_parser = parse_input, required = true)]
    pub inputs: Vec<(String, f64)>,

    /// Output lot id (generated if omitted).
    #[arg(long = "output-id")]
    pub output_id: Option<String>,

    /// Output lot number, or serial number with --output-serial.
    #[arg(long = "output-reference")]
    pub output_reference: String,

    #[arg(long = "output-serial")]
    pub output_serial: bool,

    #[arg(long = "output-designation", default_value = "")]
    pub output_designation: String,

    #[arg(long = "output-type", default_value = "")]
    pub output_type: String,

    #[arg(long = "output-quantity", default_value_t = 0.0)]
    pub output_quantity: f64,

    /// Output document key; repeatable.
    #[arg(long = "output-doc")]
    pub output_documents: Vec<String>,
}

/// Parse one `ID=QTY` input.
pub fn parse_input(raw: &str) -> Result<(String, f64), String> {
    let (id, qty) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ID=QTY, got '{}'", raw))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing lot id in '{}'", raw));
    }
    let qty: f64 = qty
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity in '{}'", raw))?;
    Ok((id.to_string(), qty))
}

impl ActivityArgs {
    pub fn into_new_activity(self) -> Result<NewActivity, ServiceError> {
        let mut inputs = BTreeMap::new();
        for (lot_id, qty) in self.inputs {
            if inputs.insert(lot_id.clone(), qty).is_some() {
                return Err(ServiceError::Validation(format!(
                    "input product lot '{}' is listed more than once",
                    lot_id
                )));
            }
        }

        Ok(NewActivity {
            id: self.id.unwrap_or_else(new_id),
            designation: self.designation,
            user_id: self.user_id,
            input_product_lots: inputs,
            output_product_lot: NewProductLot {
                id: self.output_id.unwrap_or_else(new_id),
                reference_number: self.output_reference,
                is_serial_number: self.output_serial,
                designation: self.output_designation,
                product_type: self.output_type,
                initial_quantity: self.output_quantity,
                document_keys: self.output_documents,
            },
        })
    }
}

pub fn run(svc: &TraceService, action: ActivityAction) -> Result<()> {
    match action {
        ActivityAction::Create(args) => {
            print_message(svc.create_activity(args.into_new_activity()?)?)
        }
        ActivityAction::Get { id } => print_json(&svc.read_activity(&id)?),
        ActivityAction::List => print_json(&svc.get_all_activities()?),
    }
}
