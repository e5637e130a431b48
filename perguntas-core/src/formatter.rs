//! Renders a result set as a short Brazilian Portuguese paragraph.
//!
//! Pure projection of its inputs: no I/O, deterministic for equal inputs.

use serde_json::Value;

use crate::types::ResultRow;

/// Fields tried, in order, as the "what was found" column
const NAME_FIELDS: &[&str] = &["produto", "nome", "item"];

/// Field-name fragments that mark a sum as money
const CURRENCY_HINTS: &[&str] = &["valor", "preco", "preço", "total"];

#[derive(Debug, Clone)]
pub struct AnswerFormatter {
    subject: String,
}

impl AnswerFormatter {
    /// `subject` opens every sentence, e.g. "A Distribuidora XYZ"
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    pub fn format(&self, question: &str, rows: &[ResultRow], sql: &str) -> String {
        if rows.is_empty() {
            return format!(
                "{} não encontrou resultados para \"{}\".",
                self.subject, question
            );
        }

        let count = rows.len();
        let mut parts = vec![format!(
            "{} encontrou {} {} para \"{}\".",
            self.subject,
            count,
            plural_for("resultado", count),
            question
        )];

        if let Some(tally) = tally_names(rows) {
            parts.push(tally);
        }

        if let Some(sums) = sum_numeric_columns(rows) {
            parts.push(sums);
        }

        parts.push(format!("SQL utilizado: {}", sql));
        parts.join(" ")
    }
}

/// "3 Coca-Colas; 1 Guaraná." for the first name-like column of the first row
fn tally_names(rows: &[ResultRow]) -> Option<String> {
    let first = rows.first()?;
    let field = NAME_FIELDS.iter().find(|f| first.contains_column(f))?;

    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        let name = match row.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        match counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, c)) => *c += 1,
            None => counts.push((name, 1)),
        }
    }

    if counts.is_empty() {
        return None;
    }

    let items: Vec<String> = counts
        .iter()
        .map(|(name, qty)| format!("{} {}", qty, plural_for(name, *qty)))
        .collect();
    Some(format!("{}.", items.join("; ")))
}

#[derive(Debug, Clone, Copy)]
enum Total {
    Int(i64),
    Float(f64),
}

impl Total {
    fn add(self, number: &serde_json::Number) -> Total {
        match (self, number.as_i64()) {
            (Total::Int(acc), Some(n)) => match acc.checked_add(n) {
                Some(sum) => Total::Int(sum),
                None => Total::Float(acc as f64 + n as f64),
            },
            _ => Total::Float(self.as_f64() + number.as_f64().unwrap_or(0.0)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Total::Int(v) => v as f64,
            Total::Float(v) => v,
        }
    }
}

/// "Somatórios: quantidade 12, valor_total R$ 150,50." over every numeric
/// column, in first-seen order. Booleans are not numbers here.
fn sum_numeric_columns(rows: &[ResultRow]) -> Option<String> {
    let mut totals: Vec<(&str, Total)> = Vec::new();
    for row in rows {
        for (column, value) in row.iter() {
            let Value::Number(number) = value else {
                continue;
            };
            match totals.iter_mut().find(|(c, _)| *c == column.as_str()) {
                Some((_, total)) => *total = total.add(number),
                None => totals.push((column.as_str(), Total::Int(0).add(number))),
            }
        }
    }

    if totals.is_empty() {
        return None;
    }

    let rendered: Vec<String> = totals
        .iter()
        .map(|(column, total)| {
            let value = if is_currency_field(column) {
                format_brl(total.as_f64())
            } else {
                match total {
                    Total::Int(v) => v.to_string(),
                    Total::Float(v) => v.to_string(),
                }
            };
            format!("{} {}", column, value)
        })
        .collect();

    Some(format!("Somatórios: {}.", rendered.join(", ")))
}

fn is_currency_field(column: &str) -> bool {
    let lower = column.to_lowercase();
    CURRENCY_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Brazilian real: `R$ 1.234,56` with a non-breaking space, `-R$ 0,50` for
/// negatives
pub fn format_brl(value: f64) -> String {
    let cents = (value * 100.0).round();
    let negative = cents < 0.0;
    let cents = cents.abs() as u128;

    let integer = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!(
        "{}R$\u{a0}{},{:02}",
        if negative { "-" } else { "" },
        grouped,
        fraction
    )
}

/// Singular for a count of exactly one, plural otherwise
pub fn plural_for(noun: &str, count: usize) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        pluralize(noun)
    }
}

/// Portuguese plural of a noun phrase. Only the first word (the head noun)
/// changes: "suco de laranja" → "sucos de laranja".
pub fn pluralize(phrase: &str) -> String {
    match phrase.split_once(' ') {
        Some((head, rest)) => format!("{} {}", pluralize_word(head), rest),
        None => pluralize_word(phrase),
    }
}

/// Regular Portuguese plural endings. Words that do not end in a lowercase
/// letter (codes, sizes like "2L", acronyms) are left alone.
fn pluralize_word(word: &str) -> String {
    let Some(last) = word.chars().last() else {
        return String::new();
    };
    if !last.is_lowercase() {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ão") {
        return format!("{}ões", stem);
    }
    // Stressed final syllable: gás → gases, mês → meses, retrós → retroses
    for (ending, replacement) in [("ás", "ases"), ("ês", "eses"), ("ós", "oses")] {
        if let Some(stem) = word.strip_suffix(ending) {
            return format!("{}{}", stem, replacement);
        }
    }
    for (ending, replacement) in [("al", "ais"), ("el", "éis"), ("ol", "óis"), ("ul", "uis"), ("il", "is")] {
        if let Some(stem) = word.strip_suffix(ending) {
            return format!("{}{}", stem, replacement);
        }
    }
    match last {
        'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'â' | 'ê' | 'ô' | 'ã' | 'õ'
        | 'n' => format!("{}s", word),
        'm' => format!("{}ns", &word[..word.len() - 1]),
        'r' | 'z' => format!("{}es", word),
        's' | 'x' => word.to_string(),
        _ => format!("{}s", word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> ResultRow {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    fn formatter() -> AnswerFormatter {
        AnswerFormatter::new("A Distribuidora XYZ")
    }

    #[test]
    fn empty_result_mentions_question() {
        let text = formatter().format("Quantas vendas ontem?", &[], "SELECT 1 LIMIT 100");
        assert_eq!(
            text,
            "A Distribuidora XYZ não encontrou resultados para \"Quantas vendas ontem?\"."
        );
    }

    #[test]
    fn singular_and_plural_result_counts() {
        let one = formatter().format("q", &[row(&[("x", json!("a"))])], "SELECT 1");
        assert!(one.contains("encontrou 1 resultado para"));

        let two = formatter().format(
            "q",
            &[row(&[("x", json!("a"))]), row(&[("x", json!("b"))])],
            "SELECT 1",
        );
        assert!(two.contains("encontrou 2 resultados para"));
    }

    #[test]
    fn currency_sum_and_sql_are_rendered() {
        let rows = vec![
            row(&[("produto", json!("Coca-Cola")), ("valor_total", json!(100.25))]),
            row(&[("produto", json!("Coca-Cola")), ("valor_total", json!(50.25))]),
        ];
        let sql = "SELECT produto, valor_total FROM vendas LIMIT 100";
        let text = formatter().format("Quantas coca colas?", &rows, sql);

        assert_eq!(
            text,
            "A Distribuidora XYZ encontrou 2 resultados para \"Quantas coca colas?\". \
             2 Coca-Colas. Somatórios: valor_total R$\u{a0}150,50. \
             SQL utilizado: SELECT produto, valor_total FROM vendas LIMIT 100"
        );
    }

    #[test]
    fn tally_keeps_first_seen_order_and_skips_nulls() {
        let rows = vec![
            row(&[("nome", json!("limão"))]),
            row(&[("nome", json!("café"))]),
            row(&[("nome", json!("limão"))]),
            row(&[("nome", Value::Null)]),
        ];
        let text = formatter().format("q", &rows, "SELECT nome FROM itens LIMIT 100");
        assert!(text.contains(" 2 limões; 1 café. "));
    }

    #[test]
    fn plain_sums_and_booleans() {
        let rows = vec![
            row(&[("quantidade", json!(3)), ("ativo", json!(true)), ("peso", json!(1.5))]),
            row(&[("quantidade", json!(4)), ("ativo", json!(false)), ("peso", json!(2))]),
        ];
        let text = formatter().format("q", &rows, "SELECT 1");
        assert!(text.contains("Somatórios: quantidade 7, peso 3.5."));
        assert!(!text.contains("ativo"));
    }

    #[test]
    fn brl_formatting() {
        assert_eq!(format_brl(150.5), "R$\u{a0}150,50");
        assert_eq!(format_brl(1234567.891), "R$\u{a0}1.234.567,89");
        assert_eq!(format_brl(0.0), "R$\u{a0}0,00");
        assert_eq!(format_brl(-12.3), "-R$\u{a0}12,30");
        assert_eq!(format_brl(999.999), "R$\u{a0}1.000,00");
    }

    #[test]
    fn portuguese_plurals() {
        assert_eq!(pluralize("resultado"), "resultados");
        assert_eq!(pluralize("item"), "itens");
        assert_eq!(pluralize("limão"), "limões");
        assert_eq!(pluralize("açúcar"), "açúcares");
        assert_eq!(pluralize("papel"), "papéis");
        assert_eq!(pluralize("barril"), "barris");
        assert_eq!(pluralize("lápis"), "lápis");
        assert_eq!(pluralize("gás"), "gases");
        assert_eq!(pluralize("mês"), "meses");
        assert_eq!(pluralize("freguês"), "fregueses");
        assert_eq!(pluralize("retrós"), "retroses");
        assert_eq!(pluralize("suco de laranja"), "sucos de laranja");
        assert_eq!(pluralize("Coca-Cola 2L"), "Coca-Colas 2L");
        assert_eq!(pluralize("SKU"), "SKU");
        assert_eq!(plural_for("resultado", 1), "resultado");
    }
}
