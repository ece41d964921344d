//! 정책 코퍼스 로더
//!
//! 한 줄에 JSON 객체 하나(`{"policy_id": ..., "text": ...}`)인 JSONL 파일을 읽습니다.
//! 빈 줄은 건너뛰고, 잘못된 JSON 줄을 만나면 줄 번호와 함께 즉시 실패합니다.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// 정책 문서 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// 정책 ID (숫자 ID도 문자열로 보관, 없으면 "")
    #[serde(default, deserialize_with = "policy_id_from_json")]
    pub policy_id: String,
    /// 본문
    #[serde(default)]
    pub text: String,
}

impl PolicyDocument {
    pub fn new(policy_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            text: text.into(),
        }
    }
}

fn policy_id_from_json<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// JSONL 파일에서 정책 문서 로드
pub fn load_corpus(path: &Path) -> Result<Vec<PolicyDocument>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;

    let docs = parse_corpus(BufReader::new(file))
        .with_context(|| format!("Failed to load corpus: {}", path.display()))?;

    tracing::info!("Loaded {} policy documents from {}", docs.len(), path.display());
    Ok(docs)
}

/// JSONL 스트림 파싱
pub fn parse_corpus<R: BufRead>(reader: R) -> Result<Vec<PolicyDocument>> {
    let mut docs = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read corpus line {}", line_no))?;

        if line.trim().is_empty() {
            continue;
        }

        let doc: PolicyDocument = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on corpus line {}", line_no))?;
        docs.push(doc);
    }

    Ok(docs)
}

// ============================================================================
// Tests
// ============================================================================
