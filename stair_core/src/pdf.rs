//! # PDF Reports
//!
//! Renders staircase estimates to PDF using Typst.
//!
//! ## Architecture
//!
//! - The page setup is an embedded Typst string with `{{...}}` placeholders
//! - Per-stair sections are formatted from the calculation result
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use stair_core::calculations::l_stair::{calculate, LStairInput};
//! use stair_core::pdf::render_stair_pdf;
//! use stair_core::tasks::ReferenceData;
//!
//! let input: LStairInput = serde_json::from_str(r#"{
//!     "label": "Garden steps",
//!     "masonry_units": ["block-7in"],
//!     "measurements": {
//!         "total_rise_cm": 90.0, "step_height_cm": 18.0, "tread_depth_cm": 30.0,
//!         "arm_a_length_cm": 150.0, "arm_b_length_cm": 150.0,
//!         "top_slab_thickness_cm": 2.0, "front_slab_thickness_cm": 2.0,
//!         "front_overhang_cm": 3.0
//!     }
//! }"#).unwrap();
//! let result = calculate(&input, &ReferenceData::default()).unwrap();
//! let pdf_bytes = render_stair_pdf(&input, &result, "Dana Estimator", "26-014").unwrap();
//! std::fs::write("stair_report.pdf", pdf_bytes).unwrap();
//! ```

use chrono::{Datelike, Utc};
use tracing::{debug, warn};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::layout::PagedDocument;
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::calculations::cut_list::{fmt_cm, format_waste_piece};
use crate::calculations::CalculationItem;
use crate::calculations::l_stair::{LStairInput, LStairResult};
use crate::errors::{CalcError, CalcResult};
use crate::estimate::EstimateFile;

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling documents without external files.
struct PdfWorld {
    /// The main source document
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    /// Library (standard functions)
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }

    /// Fonts bundled with typst-assets
    fn load_fonts() -> Vec<Font> {
        let mut fonts = Vec::new();
        for font_bytes in typst_assets::fonts() {
            let buffer = Bytes::new(font_bytes.to_vec());
            fonts.extend(Font::iter(buffer));
        }
        fonts
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(now.year(), now.month() as u8, now.day() as u8)
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Page setup shared by every report
const PAGE_SETUP: &str = r##"
#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2cm, left: 2cm, right: 2cm),
  header: align(right)[
    #text(size: 9pt, fill: gray)[Stepwise Staircase Estimate]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Job: {{JOB_ID}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 10.5pt)
#set table(inset: 6pt, stroke: 0.5pt)
"##;

/// Title block and project table for a single-stair report
const STAIR_TITLE: &str = r##"
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[L-Shaped Staircase Estimate]
    #v(4pt)
    #text(size: 14pt)[{{LABEL}}]
  ]
]

#v(12pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  [Estimator:], [{{ESTIMATOR}}],
  [Job ID:], [{{JOB_ID}}],
  [Date:], [{{DATE}}],
)
"##;

const FOOTNOTE: &str = r##"
#v(24pt)
#line(length: 100%, stroke: 0.5pt)
#v(8pt)
#text(size: 9pt, fill: gray)[
  Generated by Stepwise. \
  Quantities exclude breakage allowance; check dimensions on site before ordering.
]
"##;

fn page_setup(job_id: &str, date: &str) -> String {
    PAGE_SETUP
        .replace("{{JOB_ID}}", &escape_typst(job_id))
        .replace("{{DATE}}", date)
}

// ============================================================================
// PDF Rendering Functions
// ============================================================================

/// Render one staircase estimate to PDF.
///
/// # Arguments
///
/// * `input` - The staircase input
/// * `result` - The calculated estimate
/// * `estimator` - Name printed on the report
/// * `job_id` - Job number
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - PDF file as bytes
/// * `Err(CalcError)` - If Typst compilation or PDF export fails
pub fn render_stair_pdf(
    input: &LStairInput,
    result: &LStairResult,
    estimator: &str,
    job_id: &str,
) -> CalcResult<Vec<u8>> {
    let date = Utc::now().format("%Y-%m-%d").to_string();

    let mut source = page_setup(job_id, &date);
    source.push_str(
        &STAIR_TITLE
            .replace("{{LABEL}}", &escape_typst(&input.label))
            .replace("{{ESTIMATOR}}", &escape_typst(estimator))
            .replace("{{JOB_ID}}", &escape_typst(job_id))
            .replace("{{DATE}}", &date),
    );
    source.push_str(&stair_sections(input, result));
    source.push_str(FOOTNOTE);

    compile_pdf(source)
}

/// Render every staircase of an estimate to a single PDF.
///
/// The cover page lists all items; an item that fails to calculate is
/// listed with its error and gets no detail pages.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - PDF file as bytes
/// * `Err(CalcError)` - If no item calculates, or rendering fails
pub fn render_estimate_pdf(estimate: &EstimateFile) -> CalcResult<Vec<u8>> {
    let date = Utc::now().format("%Y-%m-%d").to_string();

    let mut summary_rows = Vec::new();
    let mut sections = Vec::new();
    for (index, (id, label, outcome)) in estimate.calculate_all().into_iter().enumerate() {
        match outcome {
            Ok(result) => {
                summary_rows.push(format!(
                    "  [{}], [{}], [{}], [{}], [{:.1}],",
                    index + 1,
                    escape_typst(&label),
                    result.masonry.total_blocks,
                    result.slabs.total_new_slabs,
                    result.total_hours
                ));
                if let Some(CalculationItem::LStair(input)) = estimate.get_item(&id) {
                    sections.push((input, result));
                }
            }
            Err(e) => {
                warn!(item = %label, error = %e, "item left out of report");
                summary_rows.push(format!(
                    "  [{}], [{}], table.cell(colspan: 3)[#text(fill: red)[{}]],",
                    index + 1,
                    escape_typst(&label),
                    escape_typst(&e.to_string())
                ));
            }
        }
    }

    if sections.is_empty() {
        return Err(CalcError::Internal {
            message: "Estimate has no staircases to export".to_string(),
        });
    }

    let mut source = page_setup(&estimate.meta.job_id, &date);
    source.push_str(&format!(
        r##"
#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 20pt, radius: 4pt)[
    #text(size: 24pt, weight: "bold")[Staircase Estimate]
    #v(8pt)
    #text(size: 16pt)[{client}]
  ]
]

#v(24pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  [Estimator:], [{estimator}],
  [Job ID:], [{job_id}],
  [Client:], [{client}],
  [Date:], [{date}],
)

#v(24pt)

== Summary

#table(
  columns: (auto, 1fr, auto, auto, auto),
  align: (left, left, right, right, right),
  table.header([*No.*], [*Staircase*], [*Blocks*], [*Slabs*], [*Hours*]),
{summary_rows}
)
"##,
        client = escape_typst(&estimate.meta.client),
        estimator = escape_typst(&estimate.meta.estimator),
        job_id = escape_typst(&estimate.meta.job_id),
        date = date,
        summary_rows = summary_rows.join("\n"),
    ));

    for (input, result) in &sections {
        source.push_str(&format!(
            r##"
#pagebreak()

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[{label}]
  ]
]
"##,
            label = escape_typst(&input.label)
        ));
        source.push_str(&stair_sections(input, result));
    }
    source.push_str(FOOTNOTE);

    compile_pdf(source)
}

fn compile_pdf(source: String) -> CalcResult<Vec<u8>> {
    debug!(bytes = source.len(), "compiling report");
    let world = PdfWorld::new(source);
    let warned = typst::compile::<PagedDocument>(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::Internal {
            message: format!("Typst compilation failed: {}", error_msgs.join("; ")),
        }
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::Internal {
            message: format!("PDF rendering failed: {}", error_msgs.join("; ")),
        }
    })
}

// ============================================================================
// Section builders
// ============================================================================

/// Input, geometry, masonry, slabs, materials and labor for one stair
fn stair_sections(input: &LStairInput, result: &LStairResult) -> String {
    let m = &input.measurements;
    let g = &result.geometry;
    let opts = &input.slabs;

    let adjustment = match &g.height_adjustment {
        Some(adj) => format!(
            "Step height adjusted from {} cm to {} cm.",
            fmt_cm(adj.requested_cm),
            fmt_cm(adj.actual_cm)
        ),
        None => String::new(),
    };

    let burial = match result.masonry.buried_depth_cm {
        Some(d) => format!("First course buried {} cm below ground.", fmt_cm(d)),
        None => String::new(),
    };

    let cutting = if result.needs_cutting() {
        "#text(fill: red)[Some steps have no clean course fit and need units cut on site.]"
    } else {
        ""
    };

    let waste = if result.slabs.waste.is_empty() {
        "None.".to_string()
    } else {
        result
            .slabs
            .waste
            .iter()
            .map(|w| format!("- {}", escape_typst(&format_waste_piece(w))))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r##"
#v(12pt)

== Measurements

#table(
  columns: (1fr, auto, auto),
  align: (left, right, left),
  table.header([*Parameter*], [*Value*], [*Unit*]),
  [Total rise], [{rise}], [cm],
  [Step height], [{step}], [cm],
  [Tread depth], [{tread}], [cm],
  [Arm A length], [{arm_a}], [cm],
  [Arm B length], [{arm_b}], [cm],
  [Top slab thickness], [{st}], [cm],
  [Front slab thickness], [{sf}], [cm],
  [Front overhang], [{overhang}], [cm],
  [Slab], [{slab}], [],
  [Gap], [{gap}], [cm],
)

== Steps

{step_count} steps of {step_height} cm. {adjustment} {burial}

#table(
  columns: (auto, auto, auto, auto, auto, auto, auto, auto, auto),
  align: right,
  table.header([*Step*], [*Height*], [*A ext.*], [*B ext.*], [*A inner*], [*B inner*], [*Unit*], [*Courses*], [*Joint*]),
{step_rows}
)

{cutting}

== Slabs

#table(
  columns: (1fr, auto),
  align: (left, right),
  [New top slabs], [{new_top}],
  [New front slabs], [{new_front}],
  [Cuts], [{cuts}],
  [Top area], [{top_area} m²],
  [Front area], [{front_area} m²],
)

=== Cut list

{cut_list}

=== Leftover offcuts

{waste}

== Materials

#table(
  columns: (1fr, auto, auto),
  align: (left, right, left),
  table.header([*Material*], [*Quantity*], [*Unit*]),
{material_rows}
)

== Labor

#table(
  columns: (1fr, auto, auto, auto),
  align: (left, right, left, right),
  table.header([*Task*], [*Quantity*], [*Unit*], [*Hours*]),
{task_rows}
  [*Total*], [], [], [*{total_hours:.1}*],
)
"##,
        rise = fmt_cm(m.total_rise_cm),
        step = fmt_cm(m.step_height_cm),
        tread = fmt_cm(m.tread_depth_cm),
        arm_a = fmt_cm(m.arm_a_length_cm),
        arm_b = fmt_cm(m.arm_b_length_cm),
        st = fmt_cm(m.top_slab_thickness_cm),
        sf = fmt_cm(m.front_slab_thickness_cm),
        overhang = fmt_cm(m.front_overhang_cm),
        slab = escape_typst(&format!("{} {}", opts.slab_size, opts.slab_type)),
        gap = fmt_cm(opts.gap_cm),
        step_count = g.step_count,
        step_height = fmt_cm(g.step_height_cm),
        adjustment = adjustment,
        burial = burial,
        step_rows = build_step_rows(result),
        cutting = cutting,
        new_top = result.slabs.new_top_slabs,
        new_front = result.slabs.new_front_slabs,
        cuts = result.slabs.total_cuts,
        top_area = format!("{:.2}", result.slabs.top_area_m2),
        front_area = format!("{:.2}", result.slabs.front_area_m2),
        cut_list = build_cut_list(result),
        waste = waste,
        material_rows = build_material_rows(result),
        task_rows = build_task_rows(result),
        total_hours = result.total_hours,
    )
}

fn build_step_rows(result: &LStairResult) -> String {
    result
        .geometry
        .steps
        .iter()
        .zip(&result.masonry.steps)
        .map(|(step, tally)| {
            let label = if step.is_platform {
                format!("{} (platform)", step.index + 1)
            } else {
                (step.index + 1).to_string()
            };
            let cut_mark = if tally.needs_cutting { " (cut)" } else { "" };
            format!(
                "  [{}], [{}], [{}], [{}], [{}], [{}], [{}], [{}{}], [{}],",
                label,
                fmt_cm(step.target_height_cm),
                fmt_cm(step.arm_a_external_cm),
                fmt_cm(step.arm_b_external_cm),
                fmt_cm(step.arm_a_inner_cm),
                fmt_cm(step.arm_b_inner_cm),
                escape_typst(tally.unit.display_name()),
                tally.courses,
                cut_mark,
                fmt_cm(tally.joint_thickness_cm),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_cut_list(result: &LStairResult) -> String {
    let lines = result.cut_list_lines();
    if lines.is_empty() {
        return "Nothing to clad.".to_string();
    }
    lines
        .iter()
        .map(|line| format!("- {}", escape_typst(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_material_rows(result: &LStairResult) -> String {
    result
        .materials
        .iter()
        .map(|m| {
            let amount = if m.unit == "pcs" {
                format!("{}", m.amount.round() as i64)
            } else {
                format!("{:.1}", m.amount)
            };
            format!("  [{}], [{}], [{}],", escape_typst(&m.name), amount, escape_typst(&m.unit))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_task_rows(result: &LStairResult) -> String {
    result
        .tasks
        .iter()
        .map(|t| {
            format!(
                "  [{}], [{:.2}], [{}], [{:.2}],",
                escape_typst(&t.task),
                t.quantity,
                escape_typst(&t.unit),
                t.hours
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape special Typst characters in user-provided text
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '[' => "\\[".to_string(),
            ']' => "\\]".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::fixtures::scenario_input;
    use crate::calculations::l_stair::calculate;
    use crate::tasks::test_support::sample_rates;
    use crate::tasks::ReferenceData;

    fn reference() -> ReferenceData {
        ReferenceData {
            task_rates: sample_rates(),
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("Step #1 [north]"), "Step \\#1 \\[north\\]");
        assert_eq!(escape_typst("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_typst("60×30 (cut)"), "60×30 (cut)");
    }

    #[test]
    fn test_stair_pdf_generation() {
        let mut input = scenario_input();
        input.label = "Back porch #2 [rear]".to_string();
        let result = calculate(&input, &reference()).unwrap();
        let pdf = render_stair_pdf(&input, &result, "Test Estimator", "TEST-001");

        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());
        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_estimate_pdf_skips_failed_items() {
        let mut estimate = EstimateFile::new("Dana", "26-001", "Hillside Villas");
        estimate.reference = reference();
        let mut broken = scenario_input();
        broken.label = "Broken".to_string();
        broken.measurements.arm_a_length_cm = 20.0;
        estimate.add_item(CalculationItem::LStair(broken));
        estimate.add_item(CalculationItem::LStair(scenario_input()));

        let pdf = render_estimate_pdf(&estimate);
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());
        assert!(pdf.unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_estimate_has_nothing_to_export() {
        let estimate = EstimateFile::new("Dana", "26-001", "Client");
        let err = render_estimate_pdf(&estimate).unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
