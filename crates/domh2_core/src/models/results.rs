//! Validated per-trait result records.

use serde::{Deserialize, Serialize};

/// One validated row of the compiled summary table.
///
/// Estimate fields keep the estimator's own text form; the compiler
/// extracts them by fixed field position and does not reformat numbers.
/// Serde renames match the compiled CSV header exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitResult {
    #[serde(rename = "Trait_ID")]
    pub trait_id: String,
    #[serde(rename = "Trait_Name")]
    pub trait_name: String,
    #[serde(rename = "Additive_h2")]
    pub additive_h2: String,
    #[serde(rename = "Additive_SE")]
    pub additive_se: String,
    #[serde(rename = "Dominance_h2")]
    pub dominance_h2: String,
    #[serde(rename = "Dominance_SE")]
    pub dominance_se: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_header_names_are_fixed() {
        let record = TraitResult {
            trait_id: "50_irnt".into(),
            trait_name: "Standing height".into(),
            additive_h2: "0.485".into(),
            additive_se: "0.021".into(),
            dominance_h2: "0.003".into(),
            dominance_se: "0.004".into(),
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&record).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with(
            "Trait_ID,Trait_Name,Additive_h2,Additive_SE,Dominance_h2,Dominance_SE"
        ));
        assert!(text.contains("50_irnt,Standing height,0.485,0.021,0.003,0.004"));
    }
}
