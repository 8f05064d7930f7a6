//! 表格单元格提取
//!
//! 门户页面里的 `<td>` / `<tr>` 经常不闭合，这里用一个很小的栈来模拟
//! 浏览器的隐式闭合规则：新的 `<td>` 关闭同级未闭合的单元格，
//! 新的 `<tr>` 关闭当前行，`</table>` 关闭表格内所有未闭合的元素。

use crate::markup::scanner::tags;
use crate::markup::text::clean_text;

/// 单元格
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// 清洗后的文本
    pub text: String,
    pub classes: Vec<String>,
    /// 所属行（不在任何 `<tr>` 内时为 None）
    pub row: Option<usize>,
}

impl Cell {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, Copy)]
enum Open {
    Table,
    Row,
    Cell(usize),
}

struct CellSpan {
    content_start: usize,
    content_end: Option<usize>,
    classes: Vec<String>,
    row: Option<usize>,
}

/// 按文档顺序提取片段中的所有单元格（包括嵌套表格中的单元格）
pub fn cells(html: &str) -> Vec<Cell> {
    let mut stack: Vec<Open> = Vec::new();
    let mut spans: Vec<CellSpan> = Vec::new();
    let mut row_count = 0usize;
    let mut current_rows: Vec<usize> = Vec::new();

    for tag in tags(html) {
        match (tag.name.as_str(), tag.closing) {
            ("table", false) => stack.push(Open::Table),
            ("table", true) => {
                while let Some(open) = stack.pop() {
                    match open {
                        Open::Table => break,
                        Open::Row => {
                            current_rows.pop();
                        }
                        Open::Cell(idx) => close_cell(&mut spans, idx, tag.start),
                    }
                }
            }
            ("tr", false) => {
                close_until_table(&mut stack, &mut spans, &mut current_rows, tag.start);
                stack.push(Open::Row);
                current_rows.push(row_count);
                row_count += 1;
            }
            ("tr", true) => {
                if stack_has_above_table(&stack, |o| matches!(o, Open::Row)) {
                    while let Some(open) = stack.pop() {
                        match open {
                            Open::Row => {
                                current_rows.pop();
                                break;
                            }
                            Open::Cell(idx) => close_cell(&mut spans, idx, tag.start),
                            Open::Table => unreachable!("已确认表格之上存在行"),
                        }
                    }
                }
            }
            ("td" | "th", false) => {
                if let Some(Open::Cell(idx)) = stack.last().copied() {
                    stack.pop();
                    close_cell(&mut spans, idx, tag.start);
                }
                let row = if stack_has_above_table(&stack, |o| matches!(o, Open::Row)) {
                    current_rows.last().copied()
                } else {
                    None
                };
                spans.push(CellSpan {
                    content_start: tag.end,
                    content_end: if tag.self_closing { Some(tag.end) } else { None },
                    classes: tag.classes().into_iter().map(str::to_string).collect(),
                    row,
                });
                if !tag.self_closing {
                    stack.push(Open::Cell(spans.len() - 1));
                }
            }
            ("td" | "th", true) => {
                if stack_has_above_table(&stack, |o| matches!(o, Open::Cell(_))) {
                    while let Some(open) = stack.pop() {
                        match open {
                            Open::Cell(idx) => {
                                close_cell(&mut spans, idx, tag.start);
                                break;
                            }
                            Open::Row => {
                                current_rows.pop();
                            }
                            Open::Table => unreachable!("已确认表格之上存在单元格"),
                        }
                    }
                }
            }
            _ => {}
        }
    }

    spans
        .into_iter()
        .map(|span| {
            let end = span.content_end.unwrap_or(html.len());
            Cell {
                text: clean_text(&html[span.content_start..end]),
                classes: span.classes,
                row: span.row,
            }
        })
        .collect()
}

/// 按行分组的单元格，只保留直接属于该行的单元格
pub fn rows(html: &str) -> Vec<Vec<Cell>> {
    let mut grouped: Vec<(usize, Vec<Cell>)> = Vec::new();

    for cell in cells(html) {
        let Some(row) = cell.row else { continue };
        match grouped.iter_mut().find(|(r, _)| *r == row) {
            Some((_, row_cells)) => row_cells.push(cell),
            None => grouped.push((row, vec![cell])),
        }
    }

    grouped.sort_by_key(|(row, _)| *row);
    grouped.into_iter().map(|(_, row_cells)| row_cells).collect()
}

fn close_cell(spans: &mut [CellSpan], idx: usize, at: usize) {
    if let Some(span) = spans.get_mut(idx) {
        span.content_end.get_or_insert(at);
    }
}

fn close_until_table(
    stack: &mut Vec<Open>,
    spans: &mut [CellSpan],
    current_rows: &mut Vec<usize>,
    at: usize,
) {
    while let Some(open) = stack.last().copied() {
        match open {
            Open::Table => break,
            Open::Row => {
                current_rows.pop();
            }
            Open::Cell(idx) => close_cell(spans, idx, at),
        }
        stack.pop();
    }
}

/// 从栈顶往下（不越过最近的表格）查找满足条件的元素
fn stack_has_above_table(stack: &[Open], pred: impl Fn(&Open) -> bool) -> bool {
    for open in stack.iter().rev() {
        if matches!(open, Open::Table) {
            return false;
        }
        if pred(open) {
            return true;
        }
    }
    false
}
