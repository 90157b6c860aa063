use crate::allot::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "runName")]
    pub run_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "generateSummaryDocument")]
    pub generate_summary_document: Option<bool>,
    #[serde(rename = "linesPerPage")]
    pub lines_per_page: Option<u32>,
}

/// Where to find the roster, and which column plays which role.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "idColumn")]
    pub id_column: String,
    #[serde(rename = "submissionTimeColumn")]
    pub submission_time_column: String,
    #[serde(rename = "nameColumn")]
    pub name_column: Option<String>,
    /// Most preferred first.
    #[serde(rename = "preferenceColumns", default)]
    pub preference_columns: Vec<String>,
}

/// Where to find the venue/lab master table, and which column plays which role.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VenueSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "codeColumn")]
    pub code_column: String,
    #[serde(rename = "venueNumberColumn")]
    pub venue_number_column: String,
    #[serde(rename = "centreNameColumn")]
    pub centre_name_column: String,
    #[serde(rename = "labNameColumn")]
    pub lab_name_column: String,
    #[serde(rename = "districtColumn")]
    pub district_column: String,
    #[serde(rename = "capacityColumn")]
    pub capacity_column: String,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRules {
    #[serde(rename = "rollStart")]
    pub roll_start: Option<u64>,
    #[serde(rename = "bufferFraction")]
    pub buffer_fraction: Option<f64>,
    #[serde(rename = "allocationMode")]
    pub allocation_mode: Option<String>,
    #[serde(rename = "strictCapacity")]
    pub strict_capacity: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AllotConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "applicantSource")]
    pub applicant_source: ApplicantSource,
    #[serde(rename = "venueSource")]
    pub venue_source: VenueSource,
    #[serde(default)]
    pub rules: RunRules,
}

pub fn read_config(path: &str) -> BAllotResult<AllotConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AllotConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> BAllotResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let js = r#"{
            "outputSettings": { "runName": "Mock test" },
            "applicantSource": {
                "provider": "csv",
                "filePath": "applicants.csv",
                "idColumn": "ApplNo",
                "submissionTimeColumn": "FSubDate"
            },
            "venueSource": {
                "provider": "xlsx",
                "filePath": "labs.xlsx",
                "codeColumn": "Code",
                "venueNumberColumn": "Venue No",
                "centreNameColumn": "Centre Name",
                "labNameColumn": "Lab name",
                "districtColumn": "District",
                "capacityColumn": "Strength"
            }
        }"#;
        let config: AllotConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.rules, RunRules::default());
        assert!(config.applicant_source.preference_columns.is_empty());
        assert_eq!(config.applicant_source.name_column, None);
        assert_eq!(config.venue_source.excel_worksheet_name, None);
        assert_eq!(config.output_settings.output_directory, None);
    }
}
