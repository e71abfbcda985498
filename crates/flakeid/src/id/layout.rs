use core::fmt;

pub(crate) struct FieldLayout {
    pub(crate) name: &'static str,
    pub(crate) bits: u32,
    pub(crate) value: u64,
}

fn center(s: impl ToString, width: usize) -> String {
    let s = s.to_string();
    let len = s.len();
    if len >= width {
        return s;
    }
    let pad = width - len;
    let left = pad / 2;
    let right = pad - left;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(right))
}

fn write_border(f: &mut fmt::Formatter<'_>, columns: &[usize]) -> fmt::Result {
    write!(f, "        +")?;
    for &w in columns {
        write!(f, "{}+", "-".repeat(w))?;
    }
    writeln!(f)
}

/// Renders an ID as a table with one column per bit field.
pub(crate) fn write_bit_layout_debug(
    f: &mut fmt::Formatter<'_>,
    type_name: &str,
    raw: u64,
    text: &str,
    fields: &[FieldLayout],
) -> fmt::Result {
    // Widest of label, decimal and hex, plus padding
    let columns: Vec<usize> = fields
        .iter()
        .map(|field| {
            let label_len = format!("{} ({})", field.name, field.bits).len();
            let dec_len = field.value.to_string().len();
            let hex_len = format!("0x{:x}", field.value).len();
            label_len.max(dec_len).max(hex_len) + 2
        })
        .collect();

    writeln!(f, "{type_name} {{")?;
    writeln!(f, "    raw id     : 0x{raw:016x} ({raw})")?;
    writeln!(f, "    text       : {text}")?;
    writeln!(f, "    layout     :")?;

    write_border(f, &columns)?;

    write!(f, "        |")?;
    for (field, &w) in fields.iter().zip(&columns) {
        let label = format!("{} ({})", field.name, field.bits);
        write!(f, "{}|", center(label, w))?;
    }
    writeln!(f)?;

    write_border(f, &columns)?;

    write!(f, "        |")?;
    for (field, &w) in fields.iter().zip(&columns) {
        write!(f, "{}|", center(field.value, w))?;
    }
    writeln!(f)?;

    write!(f, "        |")?;
    for (field, &w) in fields.iter().zip(&columns) {
        write!(f, "{}|", center(format!("0x{:x}", field.value), w))?;
    }
    writeln!(f)?;

    write_border(f, &columns)?;

    write!(f, "}}")
}
