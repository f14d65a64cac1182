//! `tracelot trace` and `tracelot audit`.

use anyhow::Result;
use trace::TraceService;

use super::print_json;

pub fn trace(svc: &TraceService, key: &str, by_id: bool) -> Result<()> {
    let tree = if by_id {
        svc.trace_product(key)?
    } else {
        svc.trace_by_reference_number(key)?
    };
    print_json(&tree)
}

pub fn audit(svc: &TraceService) -> Result<()> {
    print_json(&svc.audit_conservation()?)
}
