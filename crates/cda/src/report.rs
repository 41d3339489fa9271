//! HTML report rendering.
//!
//! Builds a complete HTML5 document from a [`ClinicalDocument`]: a header with the custodian
//! and title, a patient block, an optional encounter block and one block per narrative
//! section. Plain-text values are escaped; section narrative is emitted as stored.

use crate::model::ClinicalDocument;
use quick_xml::escape::escape;

const PATIENT_KEY_WIDTH: &str = "15%";
const PATIENT_ID_KEY_WIDTH: &str = "30%";
const ENCOUNTER_KEY_WIDTH: &str = "15%";

const SECTION_TABLE: &str = "<table>";
const STYLED_SECTION_TABLE: &str = r#"<table class="table table-sm table-bordered">"#;

const STYLE_RULES: &str = "<style>
body {
    margin: 2em 10%;
}
h3 {
    margin-top: 1em;
}
thead>tr>td {
    font-weight: bold;
}
caption {
    color: #444;
    font-weight: bold;
    caption-side: top;
}
</style>";

/// Presentation settings for a single report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub logo_url: Option<String>,
    pub stylesheet_url: Option<String>,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show an image floated to the right of the heading.
    pub fn with_logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }

    /// Link an external stylesheet from the document head.
    pub fn with_stylesheet_url(mut self, url: impl Into<String>) -> Self {
        self.stylesheet_url = Some(url.into());
        self
    }
}

/// Append-only HTML accumulator.
struct HtmlBuilder {
    out: String,
}

impl HtmlBuilder {
    fn new() -> Self {
        Self {
            out: String::with_capacity(4096),
        }
    }

    fn raw(&mut self, html: &str) -> &mut Self {
        self.out.push_str(html);
        self
    }

    fn text(&mut self, value: &str) -> &mut Self {
        self.out.push_str(&escape(value));
        self
    }

    fn line(&mut self, html: &str) -> &mut Self {
        self.out.push_str(html);
        self.out.push('\n');
        self
    }

    fn table_open(&mut self, id: &str) -> &mut Self {
        self.line(&format!(r#"<table id="{id}" class="table table-sm">"#))
    }

    fn table_close(&mut self) -> &mut Self {
        self.line("</table>")
    }

    /// Two-column row; `value_html` is emitted as given.
    fn row_html(&mut self, width: &str, key: &str, value_html: &str) -> &mut Self {
        self.out.push_str(&format!(
            "<tr><td width=\"{width}\">{}</td><td>{value_html}</td></tr>\n",
            escape(key)
        ));
        self
    }

    fn row(&mut self, width: &str, key: &str, value: &str) -> &mut Self {
        self.row_html(width, key, &escape(value))
    }

    fn row_if_present(&mut self, width: &str, key: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.row(width, key, value);
        }
        self
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Render `document` as a complete HTML page.
///
/// Output depends only on the document and `options`.
pub fn render(document: &ClinicalDocument, options: &ReportOptions) -> String {
    let mut html = HtmlBuilder::new();

    write_head(&mut html, document, options);
    write_document_fields(&mut html, document, options);
    write_patient(&mut html, document);
    write_encounter(&mut html, document);
    write_sections(&mut html, document);
    write_footer(&mut html);

    let report = html.finish();
    tracing::debug!(
        bytes = report.len(),
        sections = document.sections.len(),
        "rendered report"
    );
    report
}

fn write_head(html: &mut HtmlBuilder, document: &ClinicalDocument, options: &ReportOptions) {
    html.line("<!doctype html>")
        .line("<html>")
        .line("<head>")
        .line(r#"<meta charset="utf-8">"#)
        .raw("<title>")
        .text(&document.title)
        .line("</title>")
        .line(r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#);

    if let Some(url) = &options.stylesheet_url {
        html.raw(r#"<link rel="stylesheet" type="text/css" href=""#)
            .text(url)
            .line(r#"" />"#);
    }

    html.line(STYLE_RULES)
        .line("</head>")
        .line("<body>")
        .line("<main>")
        .line(r#"<div class="container-fluid">"#);
}

fn write_document_fields(
    html: &mut HtmlBuilder,
    document: &ClinicalDocument,
    options: &ReportOptions,
) {
    if let Some(url) = &options.logo_url {
        html.raw(r#"<img src=""#)
            .text(url)
            .line(r#"" style="float:right;" />"#);
    }

    html.raw("<h1>");
    let custodian = document.custodian_name();
    if !custodian.is_empty() {
        html.text(custodian).raw("<br>");
    }
    html.text(&document.title).line("</h1>");

    let published = document.effective_time();
    if !published.is_empty() {
        html.raw("<p><b>Published ")
            .text(published)
            .line("</b></p>");
    }

    html.line("<hr />");
}

fn write_patient(html: &mut HtmlBuilder, document: &ClinicalDocument) {
    let role = document.patient_role();

    let name = role
        .and_then(|r| r.name())
        .map(|n| n.display_name())
        .unwrap_or_default();
    let address = role
        .and_then(|r| r.address())
        .map(|a| a.display_address())
        .unwrap_or_default();
    let birth = role.and_then(|r| r.birth_time()).unwrap_or_default();
    let gender = role
        .and_then(|r| r.gender())
        .map(|c| c.display_name.as_str())
        .unwrap_or_default();

    html.line(r#"<h3 class="text-primary">Patient</h3>"#)
        .table_open("patient")
        .row(PATIENT_KEY_WIDTH, "Patient", &name)
        .row_html(PATIENT_KEY_WIDTH, "Address", &address)
        .row(PATIENT_KEY_WIDTH, "DOB", birth)
        .row(PATIENT_KEY_WIDTH, "Gender", gender)
        .table_close();

    html.line(r#"<h5 class="text-primary">Patient IDs</h5>"#)
        .table_open("patient-ids");
    for id in role.map(|r| r.ids.as_slice()).unwrap_or_default() {
        html.row(PATIENT_ID_KEY_WIDTH, &id.extension, &id.root);
    }
    html.table_close();
}

fn write_encounter(html: &mut HtmlBuilder, document: &ClinicalDocument) {
    let Some(encounter) = document.encompassing_encounter() else {
        return;
    };

    let organizer = document.sections.first().and_then(|s| s.organizer());
    let accession = organizer.map(|o| o.accession_number()).unwrap_or_default();
    let status = organizer.map(|o| o.status()).unwrap_or_default();
    let collected = organizer.map(|o| o.effective_time()).unwrap_or_default();
    let assigned_person = encounter
        .assigned_person()
        .map(|n| n.display_name())
        .unwrap_or_default();

    html.line(r#"<h3 class="text-primary">Encounter</h3>"#)
        .table_open("encounter")
        .row_if_present(ENCOUNTER_KEY_WIDTH, "Custodian", document.custodian_name())
        .row_if_present(ENCOUNTER_KEY_WIDTH, "Accession Number", accession)
        .row_if_present(ENCOUNTER_KEY_WIDTH, "Status", status)
        .row_if_present(ENCOUNTER_KEY_WIDTH, "Effective Time", collected)
        .row_if_present(ENCOUNTER_KEY_WIDTH, "Type", encounter.encounter_type())
        .row_if_present(ENCOUNTER_KEY_WIDTH, "Assigned Person", &assigned_person)
        .row_if_present(ENCOUNTER_KEY_WIDTH, "Facility", encounter.facility_name())
        .table_close();
}

fn write_sections(html: &mut HtmlBuilder, document: &ClinicalDocument) {
    for section in &document.sections {
        html.raw(r#"<h3 class="text-primary">"#)
            .text(&section.title)
            .line("</h3>");

        html.line(&section.text.replace(SECTION_TABLE, STYLED_SECTION_TABLE));

        if !section.accredited_text.is_empty() {
            html.line("<hr />")
                .raw("<p>")
                .raw(&section.accredited_text)
                .line("</p>");
        }
    }
}

fn write_footer(html: &mut HtmlBuilder) {
    html.line("</div>")
        .line("</main>")
        .line("</body>")
        .raw("</html>");
}

impl ClinicalDocument {
    /// Render this document as an HTML report. See [`render`].
    pub fn generate_report(&self, options: &ReportOptions) -> String {
        render(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Address, Code, EncompassingEncounter, HealthCareFacility, Identifier, Organization,
        Organizer, PersonName, RecordTarget, StructuredBodySection, Timestamp,
    };

    fn patient() -> RecordTarget {
        let mut target = RecordTarget::default();
        let role = &mut target.patient_role;
        role.names.push(PersonName {
            prefix: "Dr".into(),
            given: "Jane".into(),
            family: "Doe".into(),
            suffix: String::new(),
        });
        role.addresses.push(Address {
            street_address_line: "123 Main St".into(),
            city: "NA".into(),
            country: "Australia".into(),
            postal_code: "2000".into(),
            ..Address::default()
        });
        role.birth_times.push(Timestamp {
            value: "02/01/1980".into(),
        });
        role.administrative_gender_codes.push(Code {
            code: "F".into(),
            display_name: "Female".into(),
            ..Code::default()
        });
        role.ids.push(Identifier {
            root: "1.2.36.1.5001".into(),
            extension: "MRN-77".into(),
            ..Identifier::default()
        });
        target
    }

    fn encounter(type_name: &str) -> EncompassingEncounter {
        EncompassingEncounter {
            codes: vec![Code {
                code: "AMB".into(),
                display_name: type_name.into(),
                ..Code::default()
            }],
            assigned_person_names: vec![PersonName {
                given: "Adam".into(),
                family: "Smith".into(),
                ..PersonName::default()
            }],
            health_care_facilities: vec![HealthCareFacility {
                name: "City Clinic".into(),
                ..HealthCareFacility::default()
            }],
        }
    }

    fn document() -> ClinicalDocument {
        ClinicalDocument {
            title: "Pathology Report".into(),
            effective_times: vec![Timestamp {
                value: "15/03/2020 09:30".into(),
            }],
            custodians: vec![Organization {
                name: "Central Pathology".into(),
                ..Organization::default()
            }],
            record_targets: vec![patient()],
            encompassing_encounters: vec![encounter("Outpatient")],
            sections: vec![StructuredBodySection {
                title: "Full Blood Count".into(),
                text: "<table><tr><td>Hb</td></tr></table><p>Normal</p><table><tr><td>WCC</td></tr></table>".into(),
                accredited_text: "NATA accredited <b>laboratory</b>".into(),
                organizers: vec![Organizer {
                    ids: vec![Identifier {
                        extension: "ACC-123".into(),
                        ..Identifier::default()
                    }],
                    status_codes: vec![Code {
                        code: "completed".into(),
                        ..Code::default()
                    }],
                    effective_times: vec![Timestamp {
                        value: "14/03/2020 18:05".into(),
                    }],
                    ..Organizer::default()
                }],
                ..StructuredBodySection::default()
            }],
            ..ClinicalDocument::default()
        }
    }

    #[test]
    fn renders_complete_page() {
        let html = render(&document(), &ReportOptions::new());

        assert!(html.starts_with("<!doctype html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("<title>Pathology Report</title>"));
        assert!(html.contains("<h1>Central Pathology<br>Pathology Report</h1>"));
        assert!(html.contains("<p><b>Published 15/03/2020 09:30</b></p>"));
        assert!(html.contains(r#"<tr><td width="15%">Patient</td><td>Dr Jane Doe</td></tr>"#));
        assert!(html.contains(
            r#"<tr><td width="15%">Address</td><td>123 Main St<br />Australia<br />2000</td></tr>"#
        ));
        assert!(html.contains(r#"<tr><td width="15%">DOB</td><td>02/01/1980</td></tr>"#));
        assert!(html.contains(r#"<tr><td width="15%">Gender</td><td>Female</td></tr>"#));
        assert!(html.contains(r#"<tr><td width="30%">MRN-77</td><td>1.2.36.1.5001</td></tr>"#));
        assert!(html.contains(r#"<h3 class="text-primary">Full Blood Count</h3>"#));
        assert!(html.contains("<hr />\n<p>NATA accredited <b>laboratory</b></p>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = document();
        let options = ReportOptions::new().with_logo_url("https://example.org/logo.png");
        assert_eq!(render(&doc, &options), render(&doc, &options));
    }

    #[test]
    fn styles_every_section_table() {
        let html = render(&document(), &ReportOptions::new());
        let styled = html.matches(STYLED_SECTION_TABLE).count();
        assert_eq!(styled, 2);
        assert!(!html.contains("<table>"));
        assert!(html.contains("<p>Normal</p>"));
    }

    #[test]
    fn encounter_block_lists_non_empty_rows() {
        let html = render(&document(), &ReportOptions::new());

        assert!(html.contains(r#"<h3 class="text-primary">Encounter</h3>"#));
        assert!(html.contains(r#"<td width="15%">Custodian</td><td>Central Pathology</td>"#));
        assert!(html.contains(r#"<td width="15%">Accession Number</td><td>ACC-123</td>"#));
        assert!(html.contains(r#"<td width="15%">Status</td><td>completed</td>"#));
        assert!(html.contains(r#"<td width="15%">Effective Time</td><td>14/03/2020 18:05</td>"#));
        assert!(html.contains(r#"<td width="15%">Type</td><td>Outpatient</td>"#));
        assert!(html.contains(r#"<td width="15%">Assigned Person</td><td>Adam Smith</td>"#));
        assert!(html.contains(r#"<td width="15%">Facility</td><td>City Clinic</td>"#));
    }

    #[test]
    fn empty_encounter_type_omits_type_row() {
        let mut doc = document();
        doc.encompassing_encounters = vec![encounter("")];

        let html = render(&doc, &ReportOptions::new());

        assert!(!html.contains(">Type</td>"));
        assert!(html.contains(">Assigned Person</td>"));
        assert!(html.contains(">Facility</td>"));
    }

    #[test]
    fn no_encounter_block_without_encounters() {
        let mut doc = document();
        doc.encompassing_encounters.clear();

        let html = render(&doc, &ReportOptions::new());

        assert!(!html.contains("Encounter</h3>"));
        assert!(!html.contains("Accession Number"));
    }

    #[test]
    fn logo_and_stylesheet_are_optional() {
        let doc = document();

        let plain = render(&doc, &ReportOptions::new());
        assert!(!plain.contains("<img"));
        assert!(!plain.contains("<link"));

        let options = ReportOptions::new()
            .with_logo_url("https://example.org/logo.png")
            .with_stylesheet_url("https://example.org/report.css");
        let styled = render(&doc, &options);
        assert!(styled.contains(r#"<img src="https://example.org/logo.png" style="float:right;" />"#));
        assert!(styled.contains(
            r#"<link rel="stylesheet" type="text/css" href="https://example.org/report.css" />"#
        ));
    }

    #[test]
    fn escapes_plain_text_values() {
        let mut doc = document();
        doc.title = "Results <final> & signed".into();

        let html = render(&doc, &ReportOptions::new());

        assert!(html.contains("<title>Results &lt;final&gt; &amp; signed</title>"));
        assert!(!html.contains("<final>"));
    }

    #[test]
    fn empty_document_renders_without_panicking() {
        let html = ClinicalDocument::default().generate_report(&ReportOptions::default());

        assert!(html.contains("<h1></h1>"));
        assert!(!html.contains("Published"));
        assert!(html.contains(r#"<tr><td width="15%">Patient</td><td></td></tr>"#));
        assert!(html.contains(r#"<table id="patient-ids" class="table table-sm">"#));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn method_matches_free_function() {
        let doc = document();
        let options = ReportOptions::new();
        assert_eq!(doc.generate_report(&options), render(&doc, &options));
    }
}
