// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use crate::{Mapping, Payload, Sequence, Variant};
use std::fmt::{Display, Formatter, Write};

impl Variant {
    /// Human-readable rendering. With `summarise`, collections and buffers show only their
    /// size, and nested values are never expanded.
    pub fn to_display_string(&self, summarise: bool) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render(&mut out, summarise);
        out
    }

    fn render(&self, out: &mut String, summarise: bool) -> std::fmt::Result {
        match self.payload() {
            Payload::None => out.write_str("None"),
            Payload::Any(s) => write!(out, "Any('{s}')"),
            Payload::String(s) => write!(out, "'{s}'"),
            Payload::Exception(e) => write!(out, "{e}"),
            Payload::List(l) if summarise => write!(out, "List(size={})", l.len()),
            Payload::List(l) => {
                out.push('[');
                render_seq(out, l.iter())?;
                out.write_char(']')
            }
            Payload::Tuple(t) if summarise => write!(out, "Tuple(size={})", t.len()),
            Payload::Tuple(t) => {
                out.push('(');
                render_seq(out, t.iter())?;
                out.write_char(')')
            }
            Payload::Array(a) if summarise => write!(
                out,
                "Array(size={}, type={})",
                a.len(),
                a.element_type()
            ),
            Payload::Array(a) => {
                out.push_str("Array(");
                render_seq(out, a.iter())?;
                out.write_char(')')
            }
            Payload::Dictionary(d) if summarise => {
                write!(out, "Dictionary(size={})", d.len())
            }
            Payload::Dictionary(d) => {
                out.push('{');
                for (i, (k, v)) in d.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write!(out, "{k}: ")?;
                    v.render(out, false)?;
                }
                out.write_char('}')
            }
            Payload::Bag(b) if summarise => write!(out, "Bag(size={})", b.len()),
            Payload::Bag(b) => {
                out.push('[');
                for (i, (k, v)) in b.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write!(out, "({k}, ")?;
                    v.render(out, false)?;
                    out.push(')');
                }
                out.write_char(']')
            }
            Payload::TimeSeries(t) if summarise => write!(out, "TimeSeries(size={})", t.len()),
            Payload::TimeSeries(t) => {
                out.push_str("TimeSeries(");
                for (i, (time, v)) in t.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write!(out, "({}, ", crate::temporal::format_date_time(time))?;
                    v.render(out, false)?;
                    out.push(')');
                }
                out.write_char(')')
            }
            Payload::DataTable(d) if summarise => write!(
                out,
                "DataTable(rows={}, columns={})",
                d.len(),
                d.columns().len()
            ),
            Payload::DataTable(d) => {
                out.push_str("DataTable(");
                for (i, c) in d.columns().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write!(out, "{}: {}", c.name(), c.column_type())?;
                }
                out.push(')');
                for row in d.rows() {
                    out.push_str("\n(");
                    render_seq(out, row.iter())?;
                    out.push(')');
                }
                Ok(())
            }
            Payload::Buffer(b) if summarise => write!(out, "Buffer(size={})", b.len()),
            Payload::Object(o) => {
                write!(out, "{}(version={})", o.name(), o.version())?;
                if summarise {
                    return Ok(());
                }
                out.push('(');
                o.deflate().render(out, false)?;
                out.write_char(')')
            }
            // Remaining primitives (including an unsummarised Buffer) use their text form.
            _ => match self.text_value() {
                Ok(text) if matches!(self.payload(), Payload::Buffer(_)) => {
                    write!(out, "Buffer({text})")
                }
                Ok(text) => out.write_str(&text),
                Err(_) => out.write_str("?"),
            },
        }
    }
}

fn render_seq<'a, I: Iterator<Item = &'a Variant>>(
    out: &mut String,
    items: I,
) -> std::fmt::Result {
    for (i, v) in items.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        v.render(out, false)?;
    }
    Ok(())
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_display_string(false))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Buffer, ExceptionInfo, TypedArray, Variant, VariantType, v_any, v_bag, v_dict, v_int32,
        v_list, v_none, v_str,
    };
    use test_case::test_case;

    #[test_case(v_none(), "None"; "none")]
    #[test_case(v_any("x"), "Any('x')"; "any")]
    #[test_case(v_str("x"), "'x'"; "string")]
    #[test_case(v_int32(-4), "-4"; "int")]
    #[test_case(v_list(&[v_int32(1), v_str("a")]), "[1, 'a']"; "list")]
    #[test_case(v_dict([("b", v_int32(2)), ("a", v_int32(1))]), "{a: 1, b: 2}"; "dictionary")]
    #[test_case(v_bag([("k", v_int32(1)), ("k", v_int32(2))]), "[(k, 1), (k, 2)]"; "bag")]
    #[test_case(Variant::from(Buffer::from_slice(&[1, 2])), "Buffer(0102)"; "buffer")]
    fn test_render_full(v: Variant, expected: &str) {
        assert_eq!(v.to_display_string(false), expected);
        assert_eq!(v.to_string(), expected);
    }

    #[test]
    fn test_render_summarised() {
        assert_eq!(v_list(&[v_int32(1), v_int32(2)]).to_display_string(true), "List(size=2)");
        assert_eq!(
            v_dict([("a", v_int32(1))]).to_display_string(true),
            "Dictionary(size=1)"
        );
        let a = Variant::from(TypedArray::new(3, VariantType::Double).unwrap());
        assert_eq!(a.to_display_string(true), "Array(size=3, type=Double)");
        assert_eq!(a.to_display_string(false), "Array(0, 0, 0)");
        assert_eq!(v_int32(5).to_display_string(true), "5");
    }

    #[test]
    fn test_render_exception() {
        let e = Variant::mk_exception(ExceptionInfo::new("ValueError", "bad").with_source("parse"));
        assert_eq!(e.to_string(), "ValueError('bad') in: parse");
    }
}
