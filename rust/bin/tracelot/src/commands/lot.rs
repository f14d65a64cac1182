//! `tracelot lot ...`

use anyhow::Result;
use clap::{Args, Subcommand};
use trace::{NewProductLot, TraceService};
use tracelot_core::new_id;

use super::{print_json, print_message};

#[derive(Subcommand, Debug)]
pub enum LotAction {
    /// Create a raw-material lot.
    Create(LotArgs),

    /// Show a lot by id.
    Get { id: String },

    /// Show a lot by reference number.
    Find { reference: String },

    /// Replace the document keys of a lot.
    Docs {
        id: String,
        /// New document keys, in order. None clears them.
        keys: Vec<String>,
    },

    /// Overwrite the available quantity of a lot.
    Available { id: String, quantity: f64 },

    /// List every lot.
    List,
}

/// Fields of a raw-material lot.
#[derive(Args, Debug, Clone)]
pub struct LotArgs {
    /// Lot id (generated if omitted).
    #[arg(long)]
    pub id: Option<String>,

    /// Lot number, or serial number with --serial.
    #[arg(long)]
    pub reference: String,

    /// The lot is a single serialized unit (quantity 1).
    #[arg(long)]
    pub serial: bool,

    #[arg(long, default_value = "")]
    pub designation: String,

    #[arg(long = "type", default_value = "")]
    pub product_type: String,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub quantity: f64,

    /// External document key; repeatable.
    #[arg(long = "doc")]
    pub document_keys: Vec<String>,
}

impl LotArgs {
    pub fn into_new_lot(self) -> NewProductLot {
        NewProductLot {
            id: self.id.unwrap_or_else(new_id),
            reference_number: self.reference,
            is_serial_number: self.serial,
            designation: self.designation,
            product_type: self.product_type,
            initial_quantity: self.quantity,
            document_keys: self.document_keys,
        }
    }
}

pub fn run(svc: &TraceService, action: LotAction) -> Result<()> {
    match action {
        LotAction::Create(args) => print_message(svc.create_product_lot(args.into_new_lot())?),
        LotAction::Get { id } => print_json(&svc.read_product_lot(&id)?),
        LotAction::Find { reference } => {
            print_json(&svc.read_product_lot_by_reference_number(&reference)?)
        }
        LotAction::Docs { id, keys } => {
            print_message(svc.update_product_lot_document_keys(&id, keys)?)
        }
        LotAction::Available { id, quantity } => {
            print_message(svc.update_product_available_quantity(&id, quantity)?)
        }
        LotAction::List => print_json(&svc.get_all_product_lots()?),
    }
}
