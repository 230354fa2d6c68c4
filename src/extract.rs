use serde_json::Value;

use crate::fetch::{FetchFailure, Strategy};

/// Placeholder rendered for any field that could not be determined,
/// distinct from a legitimate empty or zero value.
pub const NOT_AVAILABLE: &str = "N/A";

/// One flat output row for a (URL, strategy) pair. Fields that could not be
/// extracted are `None` and render as the `N/A` sentinel, so every row of a
/// batch is rectangular by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub url: String,
    pub strategy: Strategy,
    /// Lighthouse performance category score, 0-100.
    pub performance_score: Option<f64>,
    pub fcp: Option<String>,
    pub lcp: Option<String>,
    pub cls: Option<String>,
    pub inp: Option<String>,
    pub tbt: Option<String>,
    /// CrUX p75 LCP in seconds.
    pub crux_lcp_p75: Option<f64>,
    /// CrUX p75 CLS, unitless.
    pub crux_cls_p75: Option<f64>,
    /// CrUX p75 INP in milliseconds.
    pub crux_inp_p75: Option<f64>,
    /// CrUX p75 FID in milliseconds.
    pub crux_fid_p75: Option<f64>,
    pub cwv_status: Option<String>,
    pub needs_improvement: bool,
    /// "OK", or the failure detail for pairs whose fetch was exhausted.
    pub status: String,
}

impl MetricRecord {
    pub fn header() -> [&'static str; 15] {
        [
            "URL",
            "Strategy",
            "Performance Score",
            "FCP",
            "LCP",
            "CLS",
            "INP",
            "TBT",
            "CrUX LCP (p75)",
            "CrUX CLS (p75)",
            "CrUX INP (p75)",
            "CrUX FID (p75)",
            "Core Web Vitals Status",
            "Needs Improvement",
            "Status",
        ]
    }

    /// Render the record as one output row, in header order.
    pub fn row(&self) -> Vec<String> {
        vec![
            self.url.clone(),
            self.strategy.as_str().to_string(),
            opt_number(self.performance_score),
            opt_text(&self.fcp),
            opt_text(&self.lcp),
            opt_text(&self.cls),
            opt_text(&self.inp),
            opt_text(&self.tbt),
            opt_number(self.crux_lcp_p75),
            opt_number(self.crux_cls_p75),
            opt_number(self.crux_inp_p75),
            opt_number(self.crux_fid_p75),
            opt_text(&self.cwv_status),
            if self.needs_improvement { "Yes" } else { "No" }.to_string(),
            self.status.clone(),
        ]
    }

    /// Sentinel row for a pair whose fetch was exhausted.
    fn failed(url: &str, strategy: Strategy, detail: String) -> Self {
        Self {
            url: url.to_string(),
            strategy,
            performance_score: None,
            fcp: None,
            lcp: None,
            cls: None,
            inp: None,
            tbt: None,
            crux_lcp_p75: None,
            crux_cls_p75: None,
            crux_inp_p75: None,
            crux_fid_p75: None,
            cwv_status: None,
            needs_improvement: false,
            status: detail,
        }
    }
}

fn opt_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn opt_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => v.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Walk an ordered key path through a JSON document, yielding `None` on any
/// missing, null, or non-object step. Centralizes the tolerance policy for
/// the partially-optional PSI response.
pub fn json_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Project a raw PSI document (or exhausted fetch) into a flat record.
/// Total: any shape the remote returns degrades to sentinel fields, never
/// an error.
pub fn extract(url: &str, strategy: Strategy, outcome: Result<Value, FetchFailure>) -> MetricRecord {
    let doc = match outcome {
        Ok(doc) => doc,
        Err(failure) => return MetricRecord::failed(url, strategy, failure.detail),
    };

    let audits = json_path(&doc, &["lighthouseResult", "audits"]);
    let performance_score =
        json_path(&doc, &["lighthouseResult", "categories", "performance", "score"])
            .and_then(Value::as_f64)
            .map(|score| score * 100.0);

    let page_metrics = json_path(&doc, &["loadingExperience", "metrics"]);
    let origin_metrics = json_path(&doc, &["originLoadingExperience", "metrics"]);

    // CrUX reports LCP/INP/FID in ms and CLS scaled by 100; normalize so the
    // Core Web Vitals thresholds apply in their documented units.
    let crux_lcp_p75 = field_percentile(page_metrics, origin_metrics, "LARGEST_CONTENTFUL_PAINT_MS")
        .map(|ms| round2(ms / 1000.0));
    let crux_cls_p75 = field_percentile(page_metrics, origin_metrics, "CUMULATIVE_LAYOUT_SHIFT_SCORE")
        .map(|scaled| scaled / 100.0);
    let crux_inp_p75 =
        field_percentile(page_metrics, origin_metrics, "INTERACTION_TO_NEXT_PAINT_MS");
    let crux_fid_p75 = field_percentile(page_metrics, origin_metrics, "FIRST_INPUT_DELAY_MS");

    MetricRecord {
        url: url.to_string(),
        strategy,
        performance_score,
        fcp: audit_display(audits, "first-contentful-paint"),
        lcp: audit_display(audits, "largest-contentful-paint"),
        cls: audit_display(audits, "cumulative-layout-shift"),
        inp: audit_display(audits, "interactive"),
        tbt: audit_display(audits, "total-blocking-time"),
        crux_lcp_p75,
        crux_cls_p75,
        crux_inp_p75,
        crux_fid_p75,
        cwv_status: json_path(&doc, &["loadingExperience", "overall_category"])
            .and_then(Value::as_str)
            .map(str::to_string),
        needs_improvement: needs_improvement(crux_lcp_p75, crux_cls_p75, crux_inp_p75),
        status: "OK".to_string(),
    }
}

fn audit_display(audits: Option<&Value>, name: &str) -> Option<String> {
    audits?
        .get(name)?
        .get("displayValue")?
        .as_str()
        .map(str::to_string)
}

/// Page-level p75 percentile for one CrUX metric, falling back to the
/// origin-level section when page field data is absent.
fn field_percentile(page: Option<&Value>, origin: Option<&Value>, key: &str) -> Option<f64> {
    percentile_of(page, key).or_else(|| percentile_of(origin, key))
}

fn percentile_of(metrics: Option<&Value>, key: &str) -> Option<f64> {
    metrics?.get(key)?.get("percentile")?.as_f64()
}

/// True when any Core Web Vital exceeds its threshold (LCP 2.5s, CLS 0.1,
/// INP 200ms). A missing vital never triggers.
pub fn needs_improvement(lcp_s: Option<f64>, cls: Option<f64>, inp_ms: Option<f64>) -> bool {
    lcp_s.is_some_and(|v| v > 2.5) || cls.is_some_and(|v| v > 0.1) || inp_ms.is_some_and(|v| v > 200.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
