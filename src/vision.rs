//! Menu extraction from PDFs through a hosted multimodal model.
//!
//! Some restaurants only publish their menu as a PDF. Those pages are
//! rendered to PNG, sent one at a time to a vision model with a fixed
//! prompt, and the JSON array it answers with is read back into
//! [`RawMenuItem`]s.
//!
//! # Architecture
//!
//! - [`VisionModel`]: async "describe this image" seam
//! - [`GeminiVision`]: the Gemini `generateContent` REST endpoint
//! - [`RetryVision`]: decorator adding bounded retry to any [`VisionModel`]
//!
//! Failures are per page: a page the model cannot read contributes zero
//! items and the remaining pages are still processed.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::fetch::{RetryPolicy, with_retry};
use crate::models::RawMenuItem;
use crate::utils::{looks_truncated, truncate_for_log};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const VISION_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_OUTPUT_TOKENS: u32 = 8000;

pub const MENU_PROMPT: &str = r#"Analyze this restaurant menu page and extract every menu item as JSON.

For each item return:
- "name": the dish or drink name
- "description": the description or ingredients for THIS item only ("" if none)
- "price": the price exactly as printed, including every size or option price
- "menu_type": the section heading the item appears under (e.g. "STARTERS", "MAINS")

Rules:
- Extract ALL items on the page, each as its own entry even when several share a line
- Never mix descriptions between items
- Skip footer text such as address, phone number and website
- Keep add-on lines ("add chicken 6") in the description of the item they modify

Return ONLY a JSON array of objects, without markdown or explanations.
Example:
[{"name": "Irish Nachos", "description": "Waffle fries, corned beef, pepper jack", "price": "$17", "menu_type": "STARTERS"}]"#;

/// Something that can answer a text prompt about a PNG image.
pub trait VisionModel {
    async fn describe(&self, prompt: &str, png: &[u8]) -> Result<String, Box<dyn Error>>;
}

/// Gemini over plain REST with the image inlined as base64.
#[derive(Clone)]
pub struct GeminiVision {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiVision {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }
}

impl fmt::Debug for GeminiVision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiVision")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request<'a>(prompt: &'a str, png: &[u8]) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: prompt },
                Part::Image {
                    inline_data: InlineData {
                        mime_type: "image/png",
                        data: STANDARD.encode(png),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: 0.1,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    }
}

/// Concatenated text of the first candidate.
fn response_text(response: GenerateResponse) -> Result<String, Box<dyn Error>> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err("vision model returned no text".into());
    }
    Ok(text)
}

impl VisionModel for GeminiVision {
    #[instrument(level = "info", skip_all, fields(model = %self.model, png_bytes = png.len()))]
    async fn describe(&self, prompt: &str, png: &[u8]) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let resp = self
            .client
            .post(self.endpoint())
            .timeout(VISION_TIMEOUT)
            .json(&build_request(prompt, png))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, elapsed_ms = t0.elapsed().as_millis(), "Vision request rejected");
            return Err(format!("vision model returned {}: {}", status, truncate_for_log(&body, 300)).into());
        }

        let text = response_text(resp.json::<GenerateResponse>().await?)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            chars = text.len(),
            "Vision model answered"
        );
        Ok(text)
    }
}

/// Adds bounded retry with linear backoff to any [`VisionModel`].
pub struct RetryVision<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: VisionModel> RetryVision<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T: fmt::Debug> fmt::Debug for RetryVision<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryVision")
            .field("inner", &self.inner)
            .field("max_attempts", &self.policy.max_attempts)
            .field("base_delay", &self.policy.base_delay)
            .finish()
    }
}

impl<T: VisionModel> VisionModel for RetryVision<T> {
    #[instrument(level = "info", skip_all)]
    async fn describe(&self, prompt: &str, png: &[u8]) -> Result<String, Box<dyn Error>> {
        with_retry("vision.describe", &self.policy, || {
            self.inner.describe(prompt, png)
        })
        .await
    }
}

/// Byte range of the first top-level JSON array in `text`. An array that
/// never closes runs to the end of the text.
fn first_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    Some(&text[start..])
}

/// Read a model answer into raw menu records.
///
/// Markdown fences are stripped and the first top-level JSON array is
/// parsed. Elements that are not objects, or that do not fit
/// [`RawMenuItem`], are skipped; records without a name are dropped.
pub fn parse_model_output(text: &str) -> Result<Vec<RawMenuItem>, serde_json::Error> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    let array = first_json_array(cleaned).unwrap_or(cleaned);

    let values: Vec<Value> = serde_json::from_str(array)?;
    let items = values
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value::<RawMenuItem>(v).ok())
        .filter(|item| !item.name.trim().is_empty())
        .collect();
    Ok(items)
}

/// Render every page of a PDF to PNG with `pdftoppm`, in page order.
#[instrument(level = "info", skip_all, fields(pdf = %pdf_path.display(), dpi = dpi))]
pub async fn rasterize_pdf(pdf_path: &Path, dpi: u32) -> Result<Vec<Vec<u8>>, Box<dyn Error>> {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "menu".to_string());
    let out_dir: PathBuf =
        std::env::temp_dir().join(format!("menu_scrape_{}_{}", std::process::id(), stem));
    fs::create_dir_all(&out_dir).await?;

    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-r")
        .arg(dpi.to_string())
        .arg(pdf_path)
        .arg(out_dir.join("page"))
        .output()
        .await?;

    if !output.status.success() {
        let _ = fs::remove_dir_all(&out_dir).await;
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("pdftoppm failed ({}): {}", output.status, stderr.trim()).into());
    }

    // pdftoppm zero-pads page numbers, so name order is page order.
    let mut page_paths = Vec::new();
    let mut entries = fs::read_dir(&out_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "png") {
            page_paths.push(path);
        }
    }
    page_paths.sort();

    let mut pages = Vec::with_capacity(page_paths.len());
    for path in &page_paths {
        pages.push(fs::read(path).await?);
    }
    let _ = fs::remove_dir_all(&out_dir).await;

    info!(pages = pages.len(), "Rendered PDF pages");
    Ok(pages)
}

/// Ask the model about one page. A truncated answer is re-asked once.
#[instrument(level = "info", skip(vision, prompt, png))]
async fn extract_page<V: VisionModel>(
    vision: &V,
    prompt: &str,
    png: &[u8],
    page: usize,
) -> Vec<RawMenuItem> {
    let answer = match vision.describe(prompt, png).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!(page, error = %e, "Vision request failed; skipping page");
            return Vec::new();
        }
    };

    let mut parsed = parse_model_output(&answer);
    if let Err(ref e) = parsed {
        if looks_truncated(e) {
            warn!(page, error = %e, "Truncated model answer; re-asking once");
            match vision.describe(prompt, png).await {
                Ok(second) => parsed = parse_model_output(&second),
                Err(e2) => warn!(page, error = %e2, "Re-ask failed"),
            }
        }
    }

    match parsed {
        Ok(items) => {
            info!(page, count = items.len(), "Extracted items from page");
            items
        }
        Err(e) => {
            warn!(
                page,
                error = %e,
                response_preview = %truncate_for_log(&answer, 300),
                "Model returned non-conforming JSON; skipping page"
            );
            Vec::new()
        }
    }
}

/// Run already-rendered pages through the model, one at a time.
pub async fn extract_menu_from_pages<V: VisionModel>(
    vision: &V,
    pages: &[Vec<u8>],
    prompt: &str,
) -> Vec<RawMenuItem> {
    let mut items = Vec::new();
    for (i, png) in pages.iter().enumerate() {
        items.extend(extract_page(vision, prompt, png, i + 1).await);
    }
    items
}

/// Render `pdf_path` and extract menu records from every page.
#[instrument(level = "info", skip(vision, prompt), fields(pdf = %pdf_path.display()))]
pub async fn extract_menu_from_pdf<V: VisionModel>(
    vision: &V,
    pdf_path: &Path,
    prompt: &str,
    dpi: u32,
) -> Result<Vec<RawMenuItem>, Box<dyn Error>> {
    let t0 = Instant::now();
    let pages = rasterize_pdf(pdf_path, dpi).await?;
    let items = extract_menu_from_pages(vision, &pages, prompt).await;
    info!(
        pages = pages.len(),
        count = items.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "Extracted menu from PDF"
    );
    Ok(items)
}
