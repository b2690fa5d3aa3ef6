use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Agg;

/// One phase per step of a fetch cycle.
#[derive(Copy, Clone, Debug)]
pub enum Phase { Select, Mark, Fetch, Ingest, WritePost }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Select => "select",
        Phase::Mark => "mark",
        Phase::Fetch => "fetch",
        Phase::Ingest => "ingest",
        Phase::WritePost => "write_post",
    }}
    fn span(&self) -> Span { match self {
        Phase::Select => info_span!("select"),
        Phase::Mark => info_span!("mark"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Ingest => info_span!("ingest"),
        Phase::WritePost => info_span!("write_post"),
    }}
}

impl OpMarker for Agg {
    const NAME: &'static str = "agg";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("agg") }
}
