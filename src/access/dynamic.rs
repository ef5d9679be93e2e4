//! Path-based access for callers that only know the schema at runtime.

use crate::access::field::element_base;
use crate::access::scalar::{read_primitive, write_primitive, Value};
use crate::core::types::FieldType;
use crate::error::{BoundsError, InvalidArgumentError, LayoutError, Result};
use crate::layout::GroupLayout;
use crate::memory::MemoryRegion;

impl GroupLayout {
    /// Read the value at `path` in the group at the start of `region`.
    pub fn read_value(&self, region: &MemoryRegion, path: &str) -> Result<Value> {
        self.read_value_at(region, 0, path)
    }

    /// Read the value at `path` in element `index` of `region`.
    pub fn read_value_indexed(&self, region: &MemoryRegion, index: usize, path: &str) -> Result<Value> {
        let base = element_base(region, self.size, index)?;
        self.read_value_at(region, base, path)
    }

    pub fn write_value(&self, region: &MemoryRegion, path: &str, value: &Value) -> Result<()> {
        self.write_value_at(region, 0, path, value)
    }

    pub fn write_value_indexed(
        &self,
        region: &MemoryRegion,
        index: usize,
        path: &str,
        value: &Value,
    ) -> Result<()> {
        let base = element_base(region, self.size, index)?;
        self.write_value_at(region, base, path, value)
    }

    /// Parse a literal for the field at `path`.
    pub fn parse_value(&self, path: &str, literal: &str) -> Result<Value> {
        let resolved = self.resolve(path)?;
        Value::parse(literal, &resolved.field_type)
    }

    /// Every leaf field of element `index` with its current value, in
    /// offset-map order.
    pub fn values(&self, region: &MemoryRegion, index: usize) -> Result<Vec<(String, Value)>> {
        let base = element_base(region, self.size, index)?;
        let mut out = Vec::new();
        self.collect_values(region, base, "", &mut out)?;
        Ok(out)
    }

    fn collect_values(
        &self,
        region: &MemoryRegion,
        base: usize,
        prefix: &str,
        out: &mut Vec<(String, Value)>,
    ) -> Result<()> {
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{}.{}", prefix, field.name)
            };
            let offset = base + field.offset;
            match &field.field_type {
                FieldType::Group(nested) => nested.collect_values(region, offset, &path, out)?,
                ty => out.push((path, read_typed(region, offset, ty)?)),
            }
        }
        Ok(())
    }

    fn read_value_at(&self, region: &MemoryRegion, base: usize, path: &str) -> Result<Value> {
        let resolved = self.resolve(path)?;
        match &resolved.field_type {
            FieldType::Group(nested) => Err(self.not_a_value(path, nested)),
            ty => read_typed(region, base + resolved.offset, ty),
        }
    }

    fn write_value_at(&self, region: &MemoryRegion, base: usize, path: &str, value: &Value) -> Result<()> {
        let resolved = self.resolve(path)?;
        let offset = base + resolved.offset;

        match (&resolved.field_type, value) {
            (FieldType::Scalar(p), _) => write_primitive(region, offset, *p, value),
            (FieldType::Array(p, n), Value::Array(items)) => {
                if items.len() != *n {
                    return Err(InvalidArgumentError::new(format!(
                        "`{}` holds {} elements, got {}",
                        path,
                        n,
                        items.len()
                    ))
                    .into());
                }
                for (i, item) in items.iter().enumerate() {
                    write_primitive(region, offset + i * p.width(), *p, item)?;
                }
                Ok(())
            }
            (FieldType::Bytes(n), Value::Bytes(data)) => {
                if data.len() != *n {
                    return Err(BoundsError::Offset {
                        offset: 0,
                        len: data.len(),
                        region_len: *n,
                    }
                    .into());
                }
                region.write_bytes(offset, data)
            }
            (FieldType::Group(nested), _) => Err(self.not_a_value(path, nested)),
            (ty, _) => Err(InvalidArgumentError::new(format!(
                "cannot store {} in `{}` of type {}",
                value, path, ty
            ))
            .into()),
        }
    }

    fn not_a_value(&self, path: &str, nested: &GroupLayout) -> crate::error::Error {
        LayoutError::TypeMismatch {
            group: self.name.clone(),
            path: path.to_string(),
            declared: format!("{} {}", nested.kind().keyword(), nested.name()),
            requested: "a value".to_string(),
        }
        .into()
    }
}

fn read_typed(region: &MemoryRegion, offset: usize, ty: &FieldType) -> Result<Value> {
    match ty {
        FieldType::Scalar(p) => read_primitive(region, offset, *p),
        FieldType::Array(p, n) => (0..*n)
            .map(|i| read_primitive(region, offset + i * p.width(), *p))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        FieldType::Bytes(n) => region.read_bytes(offset, *n).map(Value::Bytes),
        FieldType::Group(nested) => {
            let mut items = Vec::new();
            nested.collect_values(region, offset, "", &mut items)?;
            Ok(Value::Array(items.into_iter().map(|(_, v)| v).collect()))
        }
    }
}
