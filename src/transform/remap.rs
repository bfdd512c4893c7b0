//! The transform stage (C5): field injection plus a text-case rewrite of
//! the message-like field carried in `NormalizedEvent.raw["message"]`.

use serde_json::Value;

use crate::event::NormalizedEvent;
use crate::pipeline::traits::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Upper,
    Lower,
    Snake,
    Camel,
}

impl CaseMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            "snake" => Some(Self::Snake),
            "camel" => Some(Self::Camel),
            _ => None,
        }
    }
}

pub struct RemapTransform {
    pub add_fields: Vec<(String, String)>,
    pub case: Option<CaseMode>,
}

impl Transform for RemapTransform {
    fn apply(&self, event: &mut NormalizedEvent) {
        for (key, value) in &self.add_fields {
            event
                .raw
                .insert(key.clone(), Value::String(value.clone()));
        }

        let Some(case) = self.case else { return };
        let Some(message) = event.raw.get("message").and_then(Value::as_str) else {
            return;
        };
        let rewritten = match case {
            CaseMode::Upper => message.to_uppercase(),
            CaseMode::Lower => message.to_lowercase(),
            CaseMode::Snake => to_snake_case(message),
            CaseMode::Camel => to_camel_case(message),
        };
        event.raw.insert("message".to_string(), Value::String(rewritten));
    }
}

fn to_snake_case(s: &str) -> String {
    let s = s.trim();
    let mut out = String::with_capacity(s.len());

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (c.is_uppercase() || c.is_whitespace() || c == '-') && !out.ends_with('_') {
            out.push('_');
        }
        if !c.is_whitespace() && c != '-' {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn to_camel_case(s: &str) -> String {
    let lower = s.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c == ' ' || c == '_')
        .filter(|w| !w.is_empty())
        .collect();

    let Some((first, rest)) = words.split_first() else {
        return lower;
    };

    let mut out = first.to_string();
    for word in rest {
        let mut chars = word.chars();
        if let Some(c) = chars.next() {
            out.extend(c.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
