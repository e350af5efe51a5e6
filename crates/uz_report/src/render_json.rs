//! JSON renderer: the report model as pretty JSON, section order = struct order.

use crate::{ReportError, ReportModel};

pub fn render_json(model: &ReportModel) -> Result<String, ReportError> {
    serde_json::to_string_pretty(model).map_err(|e| ReportError::Template(format!("json_serialize: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_model, sample_result};

    #[test]
    fn sections_in_model_order() {
        let s = render_json(&build_model(&sample_result()).unwrap()).unwrap();
        let cover = s.find("\"cover\"").unwrap();
        let totals = s.find("\"totals\"").unwrap();
        let integrity = s.find("\"integrity\"").unwrap();
        assert!(cover < totals && totals < integrity);
    }
}
