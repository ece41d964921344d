//! 프롬프트 템플릿
//!
//! `{name}` 자리표시자를 한 번의 스캔으로 치환합니다. 치환된 값은 다시 검사하지 않으므로
//! 사용자 질문에 `{context}` 같은 문자열이 들어 있어도 그대로 남습니다.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// 범위 밖 질문에 대한 고정 거절 문구
pub const REFUSAL_MESSAGE: &str =
    "죄송하지만, 이 서비스는 복지 제도를 안내하기 위한 챗봇이기 때문에 해당 질문에는 답변드리기 어렵습니다.";

/// 참고 문서에 없는 내용을 물었을 때의 문구
pub const NOT_IN_DOCUMENT_MESSAGE: &str = "문서에 없는 내용이라 답변하기 어렵습니다.";

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("missing value for prompt variable `{0}`")]
    MissingVariable(String),
}

/// 정적 프롬프트 템플릿
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// 변수 값을 치환하여 프롬프트 생성
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, PromptError> {
        let mut output = String::with_capacity(self.template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(self.template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let value = values
                .iter()
                .find(|(key, _)| *key == name.as_str())
                .map(|(_, value)| *value)
                .ok_or_else(|| PromptError::MissingVariable(name.as_str().to_string()))?;

            output.push_str(&self.template[last..whole.start()]);
            output.push_str(value);
            last = whole.end();
        }

        output.push_str(&self.template[last..]);
        Ok(output)
    }
}

// ============================================================================
// Templates
// ============================================================================

/// 복지 신청 가이드 추출 (JSON 출력)
pub const GUIDE_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"You are the "AI Welfare Application Guide".
Read the Korean welfare document below and extract structured application guidance.

OUTPUT RULES:
1. Output ONLY one valid JSON object. No markdown, comments, or explanations.
2. Every JSON value MUST be written in Korean.
3. Keep each value short enough for a mobile screen.
4. Use only facts written in the document. If a field is not stated, use "" (empty string).
5. Never guess or infer an application period.

FIELDS:
- keywords: the key terms of the program.
- guide.who: who is eligible to apply.
- guide.when: when to apply (deadline, period, or "상시 신청").
- guide.where: the concrete place or channel to apply, such as "거주지 동주민센터" or an online portal. Not a city, region, or law name.
- guide.what: the benefit, reduction, or amount provided.
- guide.how: the application procedure only, such as "동주민센터 방문 신청". Not eligibility conditions or legal references.
- guide.why: the purpose of the program.

{format_instructions}

DOCUMENT:
{question}
"#,
);

/// 문서 요약 (2~3문장)
pub const SUMMARY_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"You are the "AI Welfare Summary Assistant".
Summarize the Korean welfare document below in 2 to 3 short Korean sentences.

RULES:
- Output only the 2 to 3 sentences, in Korean.
- Keep sentences short and mobile-friendly.
- Do not add anything that is not in the document.
- Cover only: what the support is, who can receive it, and how to apply or use it.

DOCUMENT:
{question}
"#,
);

/// 복지 안내 챗봇 (참고 문서 기반 대화)
pub const CHATBOT_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"당신은 한국의 복지 제도를 쉽고 자연스러운 한국어로 안내하는 AI 상담원입니다.

[역할]
- 복지 공고, 지침, 제도 설명을 정확히 이해하고 모바일에서 읽기 쉬운 문장으로 풀어 설명합니다.
- 대상자 요건, 지원 내용, 신청 절차, 용어 뜻을 묻는 질문에 답합니다.
- 요약 요청에는 짧게, 절차 요청에는 단계별로, 용어 질문에는 짧은 정의로 답합니다.

[규칙]
1. 모든 답변은 한국어로만 작성합니다.
2. 아래 [참고 문서]에 있는 내용만 사용하고, 추측하거나 지어내지 않습니다.
3. 참고 문서에 없는 내용이면 "{not_in_document}"라고 답합니다.
4. 법령 조항 번호나 어려운 행정 용어는 사용자가 요청하지 않는 한 쓰지 않습니다.
5. 친절하고 차분한 말투를 유지합니다.

[범위 밖 질문]
복지 제도와 관련 없는 질문에는 다음 문장으로만 답합니다.
"{refusal}"

[참고 문서]
{context}

[사용자 질문]
{question}
"#,
);

// ============================================================================
// Tests
// ============================================================================
