//! 文本清洗

use once_cell::sync::Lazy;
use regex::Regex;

static STRIP_TAGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("标签正则无效"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("空白正则无效"));

/// 清洗一段 HTML 片段：去标签、解码实体、折叠空白
pub fn clean_text(fragment: &str) -> String {
    let without_tags = STRIP_TAGS_RE.replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// 去掉标签末尾的冒号，例如 "Candidate Name :" -> "Candidate Name"
pub fn strip_label_suffix(label: &str) -> &str {
    label.trim_end().trim_end_matches(&[':', '：'][..]).trim_end()
}

/// 标签比较用的键：忽略大小写和所有空白
///
/// "Question Type :" 和 "question type:" 得到同一个键。
pub fn label_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 为固定前缀构造宽松匹配的正则：忽略大小写，前缀字符之间允许任意空白
///
/// 例如 "Section : " 可以匹配 "Section:VARC"、"SECTION :  VARC"。
pub fn loose_prefix_pattern(prefix: &str) -> Result<Regex, regex::Error> {
    let body = prefix
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(r"\s*");
    Regex::new(&format!(r"(?i)^\s*{}\s*", body))
}

/// 用宽松前缀剥离文本开头，前缀不存在时原样返回（去掉首尾空白）
pub fn strip_loose_prefix<'a>(text: &'a str, pattern: &Regex) -> &'a str {
    match pattern.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text.trim(),
    }
}
