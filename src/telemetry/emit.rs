use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};

#[derive(Serialize)]
pub struct Meta {
    pub duration_ms: u128,
}

pub fn envelope<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> serde_json::Value {
    json!({ "op": op, "result": result, "meta": meta })
}

pub fn print_result<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = envelope(op, result, meta);
    let mut out = io::stdout();
    serde_json::to_writer(&mut out, &env)?;
    writeln!(&mut out)?;
    Ok(())
}
