//! Column type registry
//!
//! A [`TypeRegistry`] maps a type tag to the constructor that builds the
//! series backing a column of that type. Tables hold the registry they were
//! built with behind an `Arc`, so a custom type registered before a table is
//! created is available to every table derived from it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::{ColumnOptions, ColumnType};
use crate::error::{Error, Result};
use crate::series::{Element, Series, SeriesTrait};
use crate::value::{JsonObject, Value};

/// 列の種類ごとのSeries生成関数
pub type SeriesConstructor =
    Arc<dyn Fn(&ColumnOptions) -> Result<Box<dyn SeriesTrait>> + Send + Sync>;

/// 型タグから Series 生成関数への対応表
#[derive(Clone)]
pub struct TypeRegistry {
    constructors: HashMap<String, SeriesConstructor>,
}

/// Constructor for a series of element type `T`
pub fn element_constructor<T: Element>() -> SeriesConstructor {
    Arc::new(|options: &ColumnOptions| {
        let series = Series::<T>::from_values(options.initial_values(), options.series_options());
        Ok(Box::new(series) as Box<dyn SeriesTrait>)
    })
}

impl TypeRegistry {
    /// Creates a registry without any type
    pub fn empty() -> Self {
        TypeRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Registers `name` with `constructor`.
    ///
    /// Fails with `EmptyTypeName` for an empty tag, `NilConstructor` when no
    /// constructor is given and `TypeAlreadyRegistered` when the tag exists.
    pub fn register(&mut self, name: &str, constructor: Option<SeriesConstructor>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::EmptyTypeName);
        }
        let constructor = constructor.ok_or_else(|| Error::NilConstructor(name.to_string()))?;
        if self.constructors.contains_key(name) {
            return Err(Error::TypeAlreadyRegistered(name.to_string()));
        }
        log::debug!("registering column type '{}'", name);
        self.constructors.insert(name.to_string(), constructor);
        Ok(())
    }

    /// Registers a closure as the constructor of `name`
    pub fn register_fn<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn(&ColumnOptions) -> Result<Box<dyn SeriesTrait>> + Send + Sync + 'static,
    {
        self.register(name, Some(Arc::new(constructor)))
    }

    /// Registers `name` as a series of element type `T`
    pub fn register_element<T: Element>(&mut self, name: &str) -> Result<()> {
        self.register(name, Some(element_constructor::<T>()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered tags in alphabetical order
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the series for a column of type `ctype`
    pub fn new_series(
        &self,
        ctype: &ColumnType,
        options: &ColumnOptions,
    ) -> Result<Box<dyn SeriesTrait>> {
        let constructor = self
            .constructors
            .get(ctype.as_str())
            .ok_or_else(|| Error::UnknownColumnType(ctype.to_string()))?;
        constructor(options)
    }
}

impl Default for TypeRegistry {
    /// Registry with the built-in types
    fn default() -> Self {
        let builtins: [(ColumnType, SeriesConstructor); 12] = [
            (ColumnType::BOOL, element_constructor::<bool>()),
            (ColumnType::STRING, element_constructor::<String>()),
            (ColumnType::INT, element_constructor::<isize>()),
            (ColumnType::INT32, element_constructor::<i32>()),
            (ColumnType::INT64, element_constructor::<i64>()),
            (ColumnType::FLOAT32, element_constructor::<f32>()),
            (ColumnType::FLOAT64, element_constructor::<f64>()),
            (ColumnType::TIME, element_constructor::<DateTime<Utc>>()),
            (ColumnType::RAW, element_constructor::<Value>()),
            (ColumnType::ARRAY, element_constructor::<Vec<JsonValue>>()),
            (ColumnType::OBJECT, element_constructor::<JsonObject>()),
            (ColumnType::ARRAY_OBJECT, element_constructor::<Vec<JsonObject>>()),
        ];
        let constructors = builtins
            .into_iter()
            .map(|(ctype, ctor)| (ctype.as_str().to_string(), ctor))
            .collect();
        TypeRegistry { constructors }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
