//! STEP exchange structure parser using pest.

use std::collections::HashMap;

use ifc4d_core::EntityId;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::StepError;

#[derive(Parser)]
#[grammar = "step.pest"]
struct StepParser;

/// A parameter value of an entity instance
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `$`
    Omitted,
    /// `*`
    Derived,
    Integer(i64),
    Real(f64),
    String(String),
    /// Enumeration literal without the dots, e.g. `T` for `.T.`
    Enumeration(String),
    Binary(String),
    Reference(EntityId),
    List(Vec<Value>),
    /// Value wrapped in a defined type, e.g. `IFCLABEL('x')`
    Typed(String, Box<Value>),
}

impl Value {
    /// The value with any defined-type wrapper removed
    pub fn untyped(&self) -> &Value {
        match self {
            Value::Typed(_, inner) => inner.untyped(),
            other => other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.untyped() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<EntityId> {
        match self.untyped() {
            Value::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.untyped() {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.untyped() {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enumeration(&self) -> Option<&str> {
        match self.untyped() {
            Value::Enumeration(e) => Some(e),
            _ => None,
        }
    }

    /// `.T.` and `.F.`; `.U.` (unknown) is `None`
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_enumeration()? {
            "T" => Some(true),
            "F" => Some(false),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self.untyped() {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// References held in a list value, in order
    pub fn references(&self) -> Vec<EntityId> {
        self.as_list()
            .map(|items| items.iter().filter_map(Value::as_reference).collect())
            .unwrap_or_default()
    }
}

/// An entity instance (`#id=KEYWORD(...)`) or a header record
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// Upper-case entity type name
    pub keyword: String,
    pub params: Vec<Value>,
}

impl Entity {
    /// Parameter at `index`, treating `$` and `*` as absent
    pub fn param(&self, index: usize) -> Option<&Value> {
        match self.params.get(index)? {
            Value::Omitted | Value::Derived => None,
            value => Some(value),
        }
    }

    pub fn is_a(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }
}

/// A parsed STEP physical file
#[derive(Clone, Debug, Default)]
pub struct StepFile {
    header: Vec<Entity>,
    entities: HashMap<EntityId, Entity>,
    by_keyword: HashMap<String, Vec<EntityId>>,
}

impl StepFile {
    /// Parse the clear text encoding of an exchange structure
    pub fn parse(input: &str) -> Result<Self, StepError> {
        let mut pairs = StepParser::parse(Rule::exchange_file, input).map_err(|e| {
            let (line, column) = match e.line_col {
                pest::error::LineColLocation::Pos((l, c)) => (l, c),
                pest::error::LineColLocation::Span((l, c), _) => (l, c),
            };
            StepError::Syntax {
                line,
                column,
                message: e.variant.message().to_string(),
            }
        })?;

        let mut file = StepFile::default();
        let Some(file_pair) = pairs.next() else {
            return Ok(file);
        };

        for section in file_pair.into_inner() {
            match section.as_rule() {
                Rule::header_section => {
                    for record in section.into_inner() {
                        file.header.push(parse_record(EntityId(0), record)?);
                    }
                }
                Rule::data_section => {
                    for pair in section.into_inner() {
                        if pair.as_rule() == Rule::entity_instance {
                            file.insert(parse_instance(pair)?)?;
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(file)
    }

    fn insert(&mut self, entity: Entity) -> Result<(), StepError> {
        let id = entity.id;
        if self.entities.contains_key(&id) {
            return Err(StepError::DuplicateInstance(id.0));
        }
        self.by_keyword
            .entry(entity.keyword.clone())
            .or_default()
            .push(id);
        self.entities.insert(id, entity);
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Instances of one entity type, in file order
    pub fn by_type<'a>(&'a self, keyword: &str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.by_keyword
            .get(&keyword.to_ascii_uppercase())
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }

    /// Number of entity instances
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn header_record(&self, keyword: &str) -> Option<&Entity> {
        self.header.iter().find(|record| record.is_a(keyword))
    }

    /// First argument of the `FILE_NAME` header record
    pub fn file_name(&self) -> Option<&str> {
        self.header_record("FILE_NAME")?
            .param(0)?
            .as_str()
            .filter(|name| !name.trim().is_empty())
    }

    /// Schema identifiers from `FILE_SCHEMA`, e.g. `["IFC4"]`
    pub fn schema_identifiers(&self) -> Vec<String> {
        self.header_record("FILE_SCHEMA")
            .and_then(|record| record.param(0))
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// =============================================================================
// Pair conversion
// =============================================================================

fn parse_instance(pair: Pair<Rule>) -> Result<Entity, StepError> {
    let mut inner = pair.into_inner();
    let (Some(name), Some(record)) = (inner.next(), inner.next()) else {
        return Err(StepError::InvalidValue("incomplete entity instance".into()));
    };
    let id = parse_instance_name(name.as_str())?;

    match record.as_rule() {
        Rule::simple_record => parse_record(id, record),
        // Complex (multi-leaf) instances keep the first partial record only
        _ => match record.into_inner().next() {
            Some(first) => parse_record(id, first),
            None => Err(StepError::InvalidValue(format!("empty complex instance {id}"))),
        },
    }
}

fn parse_record(id: EntityId, pair: Pair<Rule>) -> Result<Entity, StepError> {
    let mut inner = pair.into_inner();
    let keyword = inner
        .next()
        .map(|k| k.as_str().to_ascii_uppercase())
        .unwrap_or_default();
    let params = match inner.next() {
        Some(list) => parse_parameter_list(list)?,
        None => Vec::new(),
    };
    Ok(Entity {
        id,
        keyword,
        params,
    })
}

fn parse_parameter_list(pair: Pair<Rule>) -> Result<Vec<Value>, StepError> {
    pair.into_inner().map(parse_parameter).collect()
}

fn parse_parameter(pair: Pair<Rule>) -> Result<Value, StepError> {
    let text = pair.as_str();
    let value = match pair.as_rule() {
        Rule::omitted => Value::Omitted,
        Rule::derived => Value::Derived,
        Rule::integer => Value::Integer(
            text.parse()
                .map_err(|_| StepError::InvalidValue(format!("Invalid integer: {}", text)))?,
        ),
        Rule::real => Value::Real(
            text.parse()
                .map_err(|_| StepError::InvalidValue(format!("Invalid real: {}", text)))?,
        ),
        Rule::string => Value::String(decode_string(&text[1..text.len() - 1])),
        Rule::enumeration => Value::Enumeration(text[1..text.len() - 1].to_ascii_uppercase()),
        Rule::binary => Value::Binary(text[1..text.len() - 1].to_string()),
        Rule::instance_name => Value::Reference(parse_instance_name(text)?),
        Rule::list => match pair.into_inner().next() {
            Some(list) => Value::List(parse_parameter_list(list)?),
            None => Value::List(Vec::new()),
        },
        Rule::typed_parameter => {
            let mut inner = pair.into_inner();
            let keyword = inner
                .next()
                .map(|k| k.as_str().to_ascii_uppercase())
                .unwrap_or_default();
            let value = match inner.next() {
                Some(value) => parse_parameter(value)?,
                None => Value::Omitted,
            };
            Value::Typed(keyword, Box::new(value))
        }
        other => {
            return Err(StepError::InvalidValue(format!(
                "Unexpected parameter {:?}: {}",
                other, text
            )))
        }
    };
    Ok(value)
}

fn parse_instance_name(text: &str) -> Result<EntityId, StepError> {
    text.trim_start_matches('#')
        .parse()
        .map(EntityId)
        .map_err(|_| StepError::InvalidValue(format!("Invalid instance name: {}", text)))
}

// =============================================================================
// String decoding
// =============================================================================

/// Decode the contents of a STEP string literal (without the quotes)
pub fn decode_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        if c == '\'' && rest.starts_with("''") {
            out.push('\'');
            rest = &rest[2..];
            continue;
        }
        if c == '\\' {
            if let Some((decoded, consumed)) = decode_directive(rest) {
                out.push_str(&decoded);
                rest = &rest[consumed..];
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Decode one control directive at the start of `s`, returning the text and
/// the number of bytes consumed
fn decode_directive(s: &str) -> Option<(String, usize)> {
    if s.starts_with("\\\\") {
        return Some(("\\".to_string(), 2));
    }
    if let Some(tail) = s.strip_prefix("\\X2\\") {
        let end = tail.find("\\X0\\")?;
        let units = hex_groups(&tail[..end], 4)?
            .into_iter()
            .map(u16::try_from)
            .collect::<Result<Vec<u16>, _>>()
            .ok()?;
        let text = String::from_utf16(&units).ok()?;
        return Some((text, 4 + end + 4));
    }
    if let Some(tail) = s.strip_prefix("\\X4\\") {
        let end = tail.find("\\X0\\")?;
        let text = hex_groups(&tail[..end], 8)?
            .into_iter()
            .map(char::from_u32)
            .collect::<Option<String>>()?;
        return Some((text, 4 + end + 4));
    }
    if let Some(tail) = s.strip_prefix("\\X\\") {
        let code = u8::from_str_radix(tail.get(..2)?, 16).ok()?;
        return Some((char::from(code).to_string(), 5));
    }
    if let Some(tail) = s.strip_prefix("\\S\\") {
        let c = tail.chars().next().filter(char::is_ascii)?;
        return Some((char::from(c as u8 + 128).to_string(), 4));
    }
    // Code page switch (\PA\ ... \PI\): text after it is read as-is
    let bytes = s.as_bytes();
    if bytes.len() >= 4 && bytes[1] == b'P' && bytes[2].is_ascii_uppercase() && bytes[3] == b'\\' {
        return Some((String::new(), 4));
    }
    None
}

fn hex_groups(hex: &str, width: usize) -> Option<Vec<u32>> {
    if !hex.is_ascii() || hex.len() % width != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(width)
        .map(|i| u32::from_str_radix(&hex[i..i + width], 16).ok())
        .collect()
}
