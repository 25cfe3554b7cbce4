//! Response parsing: OCR JSON → typed [`OcrPage`] → plain text.
//!
//! The body is first parsed into a [`serde_json::Value`] tree and then walked
//! by hand. Every level (`regions`, `lines`, `words`, `text`) is checked for
//! presence and type, so a malformed response fails with a path to the
//! offending field instead of silently yielding an empty page.
//!
//! Only `text` is required on a word. `boundingBox`, `language`,
//! `orientation` and `textAngle` are carried along when present.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an OCR response could not be turned into an [`OcrPage`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing field '{path}'")]
    MissingField { path: String },

    #[error("field '{path}' is not {expected}")]
    WrongType { path: String, expected: &'static str },

    /// The endpoint answered with its error envelope instead of a result.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
}

/// One recognised page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub language: Option<String>,
    pub orientation: Option<String>,
    pub text_angle: Option<f64>,
    pub regions: Vec<OcrRegion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrRegion {
    pub bounding_box: Option<String>,
    pub lines: Vec<OcrLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub bounding_box: Option<String>,
    pub words: Vec<OcrWord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub bounding_box: Option<String>,
    pub text: String,
}

impl OcrLine {
    /// Words of the line joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl OcrPage {
    /// Parse a raw response body.
    pub fn from_json(raw: &str) -> Result<Self, ExtractError> {
        let root: Value = serde_json::from_str(raw)?;
        Self::from_value(&root)
    }

    /// Walk an already parsed response tree.
    pub fn from_value(root: &Value) -> Result<Self, ExtractError> {
        let obj = as_object(root, "$")?;

        let regions = match obj.get("regions") {
            Some(v) => as_array(v, "regions")?,
            None => {
                return Err(api_error(obj).unwrap_or_else(|| ExtractError::MissingField {
                    path: "regions".into(),
                }))
            }
        };

        let regions = regions
            .iter()
            .enumerate()
            .map(|(r, region)| parse_region(region, r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OcrPage {
            language: obj.get("language").and_then(Value::as_str).map(str::to_owned),
            orientation: obj
                .get("orientation")
                .and_then(Value::as_str)
                .map(str::to_owned),
            text_angle: obj.get("textAngle").and_then(Value::as_f64),
            regions,
        })
    }

    /// All lines of the page in reading order (region by region).
    pub fn lines(&self) -> impl Iterator<Item = &OcrLine> {
        self.regions.iter().flat_map(|r| r.lines.iter())
    }

    pub fn word_count(&self) -> usize {
        self.lines().map(|l| l.words.len()).sum()
    }

    /// Words space-joined per line, lines newline-joined.
    pub fn plain_text(&self) -> String {
        self.lines()
            .map(OcrLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Pull `code`/`message` out of an error body, either bare or wrapped in
/// an `"error"` object.
pub fn api_error(obj: &Map<String, Value>) -> Option<ExtractError> {
    let envelope = match obj.get("error") {
        Some(Value::Object(inner)) => inner,
        _ => obj,
    };
    let message = envelope.get("message").and_then(Value::as_str)?;
    let code = envelope
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    Some(ExtractError::Api {
        code: code.to_owned(),
        message: message.to_owned(),
    })
}

/// Best-effort description of an error body for a failed HTTP status.
pub fn describe_error_body(raw: &str) -> Option<String> {
    let root: Value = serde_json::from_str(raw).ok()?;
    let obj = root.as_object()?;
    api_error(obj).map(|e| e.to_string())
}

fn parse_region(region: &Value, r: usize) -> Result<OcrRegion, ExtractError> {
    let path = format!("regions[{r}]");
    let obj = as_object(region, &path)?;
    let lines = as_array(required(obj, &path, "lines")?, &format!("{path}.lines"))?;

    let lines = lines
        .iter()
        .enumerate()
        .map(|(l, line)| parse_line(line, &format!("{path}.lines[{l}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OcrRegion {
        bounding_box: bounding_box(obj),
        lines,
    })
}

fn parse_line(line: &Value, path: &str) -> Result<OcrLine, ExtractError> {
    let obj = as_object(line, path)?;
    let words = as_array(required(obj, path, "words")?, &format!("{path}.words"))?;

    let words = words
        .iter()
        .enumerate()
        .map(|(w, word)| {
            let word_path = format!("{path}.words[{w}]");
            let obj = as_object(word, &word_path)?;
            let text = required(obj, &word_path, "text")?
                .as_str()
                .ok_or_else(|| ExtractError::WrongType {
                    path: format!("{word_path}.text"),
                    expected: "a string",
                })?;
            Ok(OcrWord {
                bounding_box: bounding_box(obj),
                text: text.to_owned(),
            })
        })
        .collect::<Result<Vec<_>, ExtractError>>()?;

    Ok(OcrLine {
        bounding_box: bounding_box(obj),
        words,
    })
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    parent: &str,
    key: &str,
) -> Result<&'a Value, ExtractError> {
    obj.get(key).ok_or_else(|| ExtractError::MissingField {
        path: format!("{parent}.{key}"),
    })
}

fn as_object<'a>(v: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ExtractError> {
    v.as_object().ok_or_else(|| ExtractError::WrongType {
        path: path.to_owned(),
        expected: "an object",
    })
}

fn as_array<'a>(v: &'a Value, path: &str) -> Result<&'a Vec<Value>, ExtractError> {
    v.as_array().ok_or_else(|| ExtractError::WrongType {
        path: path.to_owned(),
        expected: "an array",
    })
}

fn bounding_box(obj: &Map<String, Value>) -> Option<String> {
    obj.get("boundingBox")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
