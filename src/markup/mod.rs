//! 答卷标记解析工具
//!
//! 答卷页面是门户生成的半结构化 HTML，不同考试之间标签层次并不稳定。
//! 这里不构建完整的 DOM，只做容错扫描：
//!
//! - `scanner` - 标签切分、按 class 查找元素（同名标签按深度配对）
//! - `table` - 表格行 / 单元格提取（兼容未闭合的 `<td>` / `<tr>`）
//! - `text` - 单元格文本清洗（去标签、解码实体、折叠空白）

pub mod scanner;
pub mod table;
pub mod text;

pub use scanner::{find_by_class, sanitize, Element};
pub use table::{cells, rows, Cell};
pub use text::{clean_text, label_key, loose_prefix_pattern, strip_label_suffix, strip_loose_prefix};
