use std::collections::HashSet;
use std::fmt::{self, Display};

use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde_json::{Map, Number, Value, json};
use thiserror::Error;

/// Why a tool cannot be described, or why its arguments were rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The input type is not an object with named fields.
    #[error("parameters must be an object with named fields")]
    NotAnObject,
    /// The type of a parameter cannot be mapped to a [`ParameterKind`].
    #[error("cannot resolve the type of parameter `{0}`")]
    UnresolvedType(String),
    /// Two parameters share a name.
    #[error("duplicate parameter `{0}`")]
    DuplicateParameter(String),
    /// Two tools in one tool set share a name.
    #[error("duplicate tool name `{0}`")]
    DuplicateTool(String),
    /// The model passed something other than an object.
    #[error("arguments must be an object")]
    ArgumentsNotAnObject,
    /// A required argument is absent.
    #[error("missing required argument `{0}`")]
    MissingArgument(String),
    /// An argument that is not a parameter.
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    /// An argument that cannot be coerced to its parameter kind.
    #[error("argument `{name}` is not a valid {expected}")]
    InvalidArgument {
        /// Name of the argument.
        name: String,
        /// The kind of the parameter.
        expected: ParameterKind,
    },
}

/// The type tag of a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// A string.
    String,
    /// An integral number.
    Integer,
    /// Any number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A list.
    Array,
    /// A nested object.
    Object,
}

impl ParameterKind {
    fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => ParameterKind::String,
            "integer" => ParameterKind::Integer,
            "number" => ParameterKind::Number,
            "boolean" => ParameterKind::Boolean,
            "array" => ParameterKind::Array,
            "object" => ParameterKind::Object,
            _ => return None,
        })
    }

    fn type_name(self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
            ParameterKind::Array => "array",
            ParameterKind::Object => "object",
        }
    }

    fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (ParameterKind::String, Value::String(s)) => Some(Value::String(s)),
            (ParameterKind::String, Value::Number(n)) => {
                Some(Value::String(n.to_string()))
            }
            (ParameterKind::String, Value::Bool(b)) => {
                Some(Value::String(b.to_string()))
            }
            (ParameterKind::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    return Some(Value::Number(n));
                }
                let f = n.as_f64()?;
                integral(f).map(Value::from)
            }
            (ParameterKind::Integer, Value::String(s)) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Some(Value::from(i));
                }
                integral(s.parse::<f64>().ok()?).map(Value::from)
            }
            (ParameterKind::Number, Value::Number(n)) => Some(Value::Number(n)),
            (ParameterKind::Number, Value::String(s)) => {
                let f = s.trim().parse::<f64>().ok()?;
                Number::from_f64(f).map(Value::Number)
            }
            (ParameterKind::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
            (ParameterKind::Boolean, Value::String(s)) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (ParameterKind::Array, value @ Value::Array(_)) => Some(value),
            (ParameterKind::Object, value @ Value::Object(_)) => Some(value),
            _ => None,
        }
    }
}

impl Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f <= i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Describes one parameter of a tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterSpec {
    name: String,
    kind: ParameterKind,
    required: bool,
    description: Option<String>,
}

impl ParameterSpec {
    /// Creates a required parameter.
    #[inline]
    pub fn new<S: Into<String>>(name: S, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
        }
    }

    /// Marks the parameter as optional.
    #[inline]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attaches a description.
    #[inline]
    pub fn with_description<S: Into<String>>(
        mut self,
        description: S,
    ) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the name of the parameter.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of the parameter.
    #[inline]
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Returns whether the parameter must be present.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the description of the parameter.
    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// The parameter list of a tool, together with the JSON schema declared to
/// the model.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    specs: Vec<ParameterSpec>,
    schema: Value,
}

impl Parameters {
    /// Builds the parameter list from explicit specs.
    pub fn new(specs: Vec<ParameterSpec>) -> Result<Self, SchemaError> {
        check_unique(&specs)?;

        let mut properties = Map::new();
        for spec in &specs {
            let mut property = Map::new();
            property.insert("type".to_owned(), json!(spec.kind.type_name()));
            if let Some(description) = &spec.description {
                property.insert("description".to_owned(), json!(description));
            }
            properties.insert(spec.name.clone(), Value::Object(property));
        }
        let required: Vec<_> = specs
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name.as_str())
            .collect();

        let schema = json!({
            "type": "object",
            "properties": properties,
            "required": required,
        });
        Ok(Self { specs, schema })
    }

    /// Derives the parameter list from the JSON schema of `T`.
    ///
    /// `T` must serialize as an object with named fields. Subschemas are
    /// inlined.
    pub fn introspect<T: JsonSchema>() -> Result<Self, SchemaError> {
        let generator = SchemaSettings::draft2020_12()
            .with(|settings| settings.inline_subschemas = true)
            .into_generator();
        let mut schema = generator.into_root_schema_for::<T>().to_value();
        if let Some(root) = schema.as_object_mut() {
            root.remove("$schema");
            root.remove("title");
        }

        let specs = specs_from_schema(&schema)?;
        check_unique(&specs)?;
        Ok(Self { specs, schema })
    }

    /// Returns the parameter specs.
    #[inline]
    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    /// Returns the JSON schema declared to the model.
    #[inline]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Coerces model-supplied arguments to the recorded parameter kinds.
    ///
    /// Absent arguments (`null`) are treated as an empty object. Optional
    /// arguments may be `null`.
    pub fn coerce(&self, arguments: Value) -> Result<Value, SchemaError> {
        let mut arguments = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(SchemaError::ArgumentsNotAnObject),
        };

        if let Some(name) = arguments
            .keys()
            .find(|name| !self.specs.iter().any(|spec| &spec.name == *name))
        {
            return Err(SchemaError::UnexpectedArgument(name.clone()));
        }

        for spec in &self.specs {
            match arguments.remove(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(SchemaError::MissingArgument(spec.name.clone()));
                }
                None => {}
                Some(Value::Null) => {
                    arguments.insert(spec.name.clone(), Value::Null);
                }
                Some(value) => {
                    let value = spec.kind.coerce(value).ok_or_else(|| {
                        SchemaError::InvalidArgument {
                            name: spec.name.clone(),
                            expected: spec.kind,
                        }
                    })?;
                    arguments.insert(spec.name.clone(), value);
                }
            }
        }
        Ok(Value::Object(arguments))
    }
}

fn check_unique(specs: &[ParameterSpec]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(SchemaError::DuplicateParameter(spec.name.clone()));
        }
    }
    Ok(())
}

fn specs_from_schema(
    schema: &Value,
) -> Result<Vec<ParameterSpec>, SchemaError> {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(SchemaError::NotAnObject);
    }
    let required: HashSet<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    // An object without `properties` is a tool without parameters.
    let Some(properties) = schema.get("properties") else {
        return Ok(vec![]);
    };
    let properties = properties.as_object().ok_or(SchemaError::NotAnObject)?;

    properties
        .iter()
        .map(|(name, property)| -> Result<ParameterSpec, SchemaError> {
            let (kind, nullable) = resolve_kind(property)
                .ok_or_else(|| SchemaError::UnresolvedType(name.clone()))?;
            Ok(ParameterSpec {
                name: name.clone(),
                kind,
                required: required.contains(name.as_str()) && !nullable,
                description: property
                    .get("description")
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned),
            })
        })
        .collect()
}

/// Maps a property schema to its kind and whether it accepts `null`.
fn resolve_kind(property: &Value) -> Option<(ParameterKind, bool)> {
    if property.get("$ref").is_some() {
        return None;
    }

    match property.get("type") {
        Some(Value::String(name)) => {
            return Some((ParameterKind::from_type_name(name)?, false));
        }
        Some(Value::Array(names)) => {
            let names: Vec<_> = names.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let mut kinds = names.into_iter().filter(|name| *name != "null");
            let kind = ParameterKind::from_type_name(kinds.next()?)?;
            return kinds.next().is_none().then_some((kind, nullable));
        }
        Some(_) => return None,
        None => {}
    }

    // `Option<T>` where `T` is not a primitive.
    let variants = property
        .get("anyOf")
        .or_else(|| property.get("oneOf"))
        .and_then(Value::as_array);
    if let Some(variants) = variants {
        let is_null =
            |v: &Value| v.get("type").and_then(Value::as_str) == Some("null");
        let nullable = variants.iter().any(is_null);
        let mut rest = variants.iter().filter(|v| !is_null(*v));
        let (kind, _) = resolve_kind(rest.next()?)?;
        return rest.next().is_none().then_some((kind, nullable));
    }

    // Enums of strings without a declared type.
    let values = property
        .get("enum")
        .and_then(Value::as_array)
        .cloned()
        .or_else(|| property.get("const").map(|v| vec![v.clone()]))?;
    values
        .iter()
        .all(Value::is_string)
        .then_some((ParameterKind::String, false))
}
