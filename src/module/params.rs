// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed, named module parameters.
//!
//! A module type declares its parameters in its constructor. Each parameter has
//! a type, a description and either a default or the `forced` flag, which means
//! the steering file must assign it. After `initialize` the list is frozen.

use crate::errors::ParamError;
use serde_yaml::Value;
use std::fmt;

/// Type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Bool,
    Int,
    Double,
    Text,
    BoolList,
    IntList,
    DoubleList,
    TextList,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Double => "double",
            ParamType::Text => "string",
            ParamType::BoolList => "list of bool",
            ParamType::IntList => "list of int",
            ParamType::DoubleList => "list of double",
            ParamType::TextList => "list of string",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    BoolList(Vec<bool>),
    IntList(Vec<i64>),
    DoubleList(Vec<f64>),
    TextList(Vec<String>),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::Int(_) => ParamType::Int,
            ParamValue::Double(_) => ParamType::Double,
            ParamValue::Text(_) => ParamType::Text,
            ParamValue::BoolList(_) => ParamType::BoolList,
            ParamValue::IntList(_) => ParamType::IntList,
            ParamValue::DoubleList(_) => ParamType::DoubleList,
            ParamValue::TextList(_) => ParamType::TextList,
        }
    }

    /// Converts to `target`; integers widen to doubles, nothing else converts.
    pub fn coerce(self, target: ParamType) -> Option<ParamValue> {
        match (self, target) {
            (value, target) if value.param_type() == target => Some(value),
            (ParamValue::Int(i), ParamType::Double) => Some(ParamValue::Double(i as f64)),
            (ParamValue::IntList(items), ParamType::DoubleList) => Some(ParamValue::DoubleList(
                items.into_iter().map(|i| i as f64).collect(),
            )),
            _ => None,
        }
    }

    /// Reads a steering-file value as `target`.
    pub fn from_yaml(value: &Value, target: ParamType) -> Result<ParamValue, String> {
        let parsed = match target {
            ParamType::Bool => value.as_bool().map(ParamValue::Bool),
            ParamType::Int => value.as_i64().map(ParamValue::Int),
            ParamType::Double => value.as_f64().map(ParamValue::Double),
            ParamType::Text => value.as_str().map(|s| ParamValue::Text(s.to_string())),
            ParamType::BoolList => sequence(value, Value::as_bool).map(ParamValue::BoolList),
            ParamType::IntList => sequence(value, Value::as_i64).map(ParamValue::IntList),
            ParamType::DoubleList => sequence(value, Value::as_f64).map(ParamValue::DoubleList),
            ParamType::TextList => {
                sequence(value, |v| v.as_str().map(str::to_string)).map(ParamValue::TextList)
            }
        };
        parsed.ok_or_else(|| format!("expected {}, found {}", target, yaml_kind(value)))
    }
}

fn sequence<T>(value: &Value, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    value.as_sequence()?.iter().map(item).collect()
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "an int",
        Value::Number(_) => "a double",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list with mixed or wrong element types",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "'{}'", v),
            ParamValue::BoolList(v) => write!(f, "[{}]", join(v)),
            ParamValue::IntList(v) => write!(f, "[{}]", join(v)),
            ParamValue::DoubleList(v) => write!(f, "[{}]", join(v)),
            ParamValue::TextList(v) => write!(f, "[{}]", join(v)),
        }
    }
}

/// Rust types a parameter can be declared and read as.
pub trait ParamKind: Sized {
    const TYPE: ParamType;

    fn into_value(self) -> ParamValue;

    fn from_value(value: &ParamValue) -> Option<Self>;
}

macro_rules! param_kind {
    ($ty:ty, $variant:ident) => {
        impl ParamKind for $ty {
            const TYPE: ParamType = ParamType::$variant;

            fn into_value(self) -> ParamValue {
                ParamValue::$variant(self)
            }

            fn from_value(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                ParamValue::$variant(value)
            }
        }
    };
}

param_kind!(bool, Bool);
param_kind!(i64, Int);
param_kind!(f64, Double);
param_kind!(String, Text);
param_kind!(Vec<bool>, BoolList);
param_kind!(Vec<i64>, IntList);
param_kind!(Vec<f64>, DoubleList);
param_kind!(Vec<String>, TextList);

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Description of one declared parameter, used for `--module-info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub default: Option<ParamValue>,
    pub forced: bool,
}

impl fmt::Display for ParamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default = match (&self.default, self.forced) {
            (_, true) => "required".to_string(),
            (Some(value), false) => format!("default {}", value),
            (None, false) => "no default".to_string(),
        };
        write!(
            f,
            "{:<20} {:<16} {:<24} {}",
            self.name,
            self.param_type.to_string(),
            default,
            self.description
        )
    }
}

#[derive(Debug, Clone)]
struct Param {
    name: String,
    param_type: ParamType,
    description: String,
    default: Option<ParamValue>,
    value: Option<ParamValue>,
    forced: bool,
}

/// The parameters of one module instance.
#[derive(Debug, Clone, Default)]
pub struct ParamList {
    params: Vec<Param>,
    frozen: bool,
    declaration_errors: Vec<ParamError>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(&mut self, param: Param) {
        if self.params.iter().any(|p| p.name == param.name) {
            self.declaration_errors.push(ParamError::Duplicate { name: param.name });
            return;
        }
        self.params.push(param);
    }

    /// Declares an optional parameter with a default value.
    pub fn add<T: ParamKind>(&mut self, name: &str, default: T, description: &str) {
        self.declare(Param {
            name: name.to_string(),
            param_type: T::TYPE,
            description: description.to_string(),
            default: Some(default.into_value()),
            value: None,
            forced: false,
        });
    }

    /// Declares a parameter the steering file must set.
    pub fn add_forced<T: ParamKind>(&mut self, name: &str, description: &str) {
        self.declare(Param {
            name: name.to_string(),
            param_type: T::TYPE,
            description: description.to_string(),
            default: None,
            value: None,
            forced: true,
        });
    }

    /// Errors collected while the module type declared its parameters.
    pub fn declaration_errors(&self) -> &[ParamError] {
        &self.declaration_errors
    }

    fn find(&self, name: &str) -> Result<&Param, ParamError> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ParamError::Unknown {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    pub fn param_type(&self, name: &str) -> Option<ParamType> {
        self.find(name).ok().map(|p| p.param_type)
    }

    pub fn set<T: ParamKind>(&mut self, name: &str, value: T) -> Result<(), ParamError> {
        self.set_value(name, value.into_value())
    }

    pub fn set_value(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        if self.frozen {
            return Err(ParamError::Frozen {
                name: name.to_string(),
            });
        }
        let param = self
            .params
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ParamError::Unknown {
                name: name.to_string(),
            })?;
        let found = value.param_type();
        let value = value
            .coerce(param.param_type)
            .ok_or_else(|| ParamError::TypeMismatch {
                name: name.to_string(),
                expected: param.param_type,
                found,
            })?;
        param.value = Some(value);
        Ok(())
    }

    /// Assigns a value read from the steering file.
    pub fn set_yaml(&mut self, name: &str, value: &Value) -> Result<(), ParamError> {
        let target = self.find(name)?.param_type;
        let value = ParamValue::from_yaml(value, target).map_err(|reason| {
            ParamError::InvalidValue {
                name: name.to_string(),
                reason,
            }
        })?;
        self.set_value(name, value)
    }

    pub fn get<T: ParamKind>(&self, name: &str) -> Result<T, ParamError> {
        let param = self.find(name)?;
        if param.param_type != T::TYPE {
            return Err(ParamError::TypeMismatch {
                name: name.to_string(),
                expected: param.param_type,
                found: T::TYPE,
            });
        }
        param
            .value
            .as_ref()
            .or(param.default.as_ref())
            .and_then(T::from_value)
            .ok_or_else(|| ParamError::NotSet {
                name: name.to_string(),
            })
    }

    /// Whether the steering file assigned the parameter.
    pub fn is_set(&self, name: &str) -> bool {
        self.find(name).is_ok_and(|p| p.value.is_some())
    }

    /// Fails on the first forced parameter without a value.
    pub fn check_forced(&self) -> Result<(), ParamError> {
        match self.params.iter().find(|p| p.forced && p.value.is_none()) {
            Some(param) => Err(ParamError::NotSet {
                name: param.name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn info(&self) -> Vec<ParamInfo> {
        self.params
            .iter()
            .map(|p| ParamInfo {
                name: p.name.clone(),
                param_type: p.param_type,
                description: p.description.clone(),
                default: p.default.clone(),
                forced: p.forced,
            })
            .collect()
    }

    /// Values assigned explicitly, in declaration order.
    pub fn assigned(&self) -> Vec<(String, ParamValue)> {
        self.params
            .iter()
            .filter_map(|p| p.value.clone().map(|v| (p.name.clone(), v)))
            .collect()
    }
}
