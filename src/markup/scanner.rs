//! 标签扫描
//!
//! 用正则切出所有开始 / 结束标签，再按同名标签的嵌套深度找到元素的边界。

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("标签正则无效")
});

static CLASS_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("class 正则无效")
});

static NOISE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("注释正则无效")
});

/// 单个标签
#[derive(Debug, Clone)]
pub struct Tag<'a> {
    /// 小写标签名
    pub name: String,
    pub closing: bool,
    pub self_closing: bool,
    /// 标签在文档中的起止字节位置
    pub start: usize,
    pub end: usize,
    attrs: &'a str,
}

impl<'a> Tag<'a> {
    /// 标签上的 class 列表
    pub fn classes(&self) -> Vec<&'a str> {
        CLASS_ATTR_RE
            .captures(self.attrs)
            .and_then(|cap| cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)))
            .map(|m| m.as_str().split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| *c == class)
    }
}

/// 去掉注释、脚本和样式块，避免其中的伪标签干扰扫描
pub fn sanitize(html: &str) -> String {
    NOISE_RE.replace_all(html, " ").into_owned()
}

/// 按文档顺序切出所有标签
pub fn tags(html: &str) -> Vec<Tag<'_>> {
    TAG_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(2)?.as_str().to_ascii_lowercase();
            let attrs = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            Some(Tag {
                name,
                closing: !cap[1].is_empty(),
                self_closing: attrs.trim_end().ends_with('/'),
                start: whole.start(),
                end: whole.end(),
                attrs,
            })
        })
        .collect()
}

/// 文档中的一个元素
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    html: &'a str,
    pub start: usize,
    pub content_start: usize,
    pub content_end: usize,
    pub end: usize,
}

impl<'a> Element<'a> {
    /// 元素内部的 HTML
    pub fn inner(&self) -> &'a str {
        &self.html[self.content_start..self.content_end]
    }

    /// 包含自身标签的完整 HTML
    pub fn outer(&self) -> &'a str {
        &self.html[self.start..self.end]
    }
}

/// 查找带有指定 class 的所有元素
///
/// 结果按文档顺序排列；嵌套在已命中元素内部的同 class 元素会被跳过。
/// 缺少结束标签的元素一直延伸到文档末尾。
pub fn find_by_class<'a>(html: &'a str, class: &str) -> Vec<Element<'a>> {
    let tags = tags(html);
    let mut found = Vec::new();
    let mut covered_until = 0;

    for (idx, tag) in tags.iter().enumerate() {
        if tag.closing || tag.start < covered_until || !tag.has_class(class) {
            continue;
        }

        let element = if tag.self_closing {
            Element {
                html,
                start: tag.start,
                content_start: tag.end,
                content_end: tag.end,
                end: tag.end,
            }
        } else {
            let (content_end, end) = matching_close(&tags, idx).unwrap_or((html.len(), html.len()));
            Element {
                html,
                start: tag.start,
                content_start: tag.end,
                content_end,
                end,
            }
        };

        covered_until = element.end;
        found.push(element);
    }

    found
}

/// 找到 `tags[open_idx]` 对应的结束标签，返回 (内容结束位置, 元素结束位置)
fn matching_close(tags: &[Tag<'_>], open_idx: usize) -> Option<(usize, usize)> {
    let name = &tags[open_idx].name;
    let mut depth = 1usize;

    for tag in tags[open_idx + 1..].iter().filter(|t| &t.name == name && !t.self_closing) {
        if tag.closing {
            depth -= 1;
            if depth == 0 {
                return Some((tag.start, tag.end));
            }
        } else {
            depth += 1;
        }
    }

    None
}
