//! 单元格文本的宽松解析（数值 / 布尔 / 名称）。

/// 整数解析：接受 `"100"`、`" 100 "` 以及整数值的小数写法 `"100.0"`（表格软件导出常见）。
pub fn parse_integer(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let v = parse_number(s)?;
    if v.fract() != 0.0 || v < i64::MIN as f64 || v > i64::MAX as f64 {
        return None;
    }
    Some(v as i64)
}

/// 有限数值；`inf`/`NaN` 视为非数值。
pub fn parse_number(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    let s = raw.trim().to_ascii_lowercase();
    match s.as_str() {
        "true" | "yes" | "y" => Some(true),
        "false" | "no" | "n" => Some(false),
        _ => parse_number(&s).map(|v| v != 0.0),
    }
}

/// 折叠内部空白：`"  Grid   Power "` → `"Grid Power"`。
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 输出文件名：`[A-Za-z0-9_.-]` 以外的字符替换为 `_`。
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '.' | '-' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer_accepts_integral_decimals_only() {
        assert_eq!(parse_integer(" 100 "), Some(100));
        assert_eq!(parse_integer("100.0"), Some(100));
        assert_eq!(parse_integer("-4"), Some(-4));
        assert_eq!(parse_integer("100.5"), None);
        assert_eq!(parse_integer("abc"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("NaN"), None);
    }

    #[test]
    fn parse_flag_variants() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("0.0"), Some(false));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn sanitize_file_stem_replaces_unsafe_chars() {
        assert_eq!(sanitize_file_stem("Temp_#"), "Temp__");
        assert_eq!(sanitize_file_stem("U#_MEAS/1 a"), "U__MEAS_1_a");
        assert_eq!(sanitize_file_stem("a-b.c"), "a-b.c");
        assert_eq!(sanitize_file_stem("Ü"), "_");
    }

    #[test]
    fn collapse_whitespace_joins_words() {
        assert_eq!(collapse_whitespace("  Grid \t  Power "), "Grid Power");
    }
}
