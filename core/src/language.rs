// Language module - 语言识别

use crate::path::base_name;

pub const UNKNOWN: &str = "unknown";

/// 扩展名 -> 语言
const LANGUAGE_TABLE: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("java", "java"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("xml", "xml"),
    ("sql", "sql"),
    ("cpp", "cpp"),
    ("cs", "csharp"),
    ("rb", "ruby"),
    ("php", "php"),
    ("go", "golang"),
    ("rs", "rust"),
    ("c", "c"),
    ("zip", "zip"),
];

/// 取文件名最后一个 `.` 之后的部分并转为小写
pub fn extension_of(name: &str) -> Option<String> {
    base_name(name)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// 根据文件名识别语言，未知扩展名返回 "unknown"
pub fn classify(name: &str) -> &'static str {
    extension_of(name)
        .and_then(|ext| {
            LANGUAGE_TABLE
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, language)| *language)
        })
        .unwrap_or(UNKNOWN)
}
