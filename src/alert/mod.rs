/// Storm surge risk assessment.
///
/// Submodules:
/// - `risk`: maximum water level and risk band classification.
/// - `report`: per-station summary handed to the renderers.

pub mod report;
pub mod risk;
