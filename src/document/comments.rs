/// 去除配置文本中的注释
///
/// 处理三种注释：
/// - `// ...` 行尾注释
/// - `/* ... */` 块注释（保留其中的换行，出错时行号仍然对得上）
/// - 首个非空白字符为 `#` 或 `;` 的整行注释
///
/// 字符串字面量内部的注释标记原样保留。
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;
    let mut line_blank = true;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                line_blank = false;
                out.push(c);
            }
            '#' | ';' if line_blank => skip_line(&mut chars, &mut out, &mut line_blank),
            '/' if chars.peek() == Some(&'/') => skip_line(&mut chars, &mut out, &mut line_blank),
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                        line_blank = true;
                    }
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            '\n' => {
                line_blank = true;
                out.push(c);
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                line_blank = false;
                out.push(c);
            }
        }
    }

    out
}

/// 跳过到行尾，保留换行符
fn skip_line(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    out: &mut String,
    line_blank: &mut bool,
) {
    for c in chars.by_ref() {
        if c == '\n' {
            out.push('\n');
            *line_blank = true;
            return;
        }
    }
}
