use tracing::trace;

use crate::{Error, Evaluator, Index, Path, Value};

impl Evaluator {
    /// Walks `path` through the data tree.
    ///
    /// A missing field or an out-of-bounds index ends the walk with `Null`,
    /// missing data is not a failure. Stepping into a present value of the
    /// wrong shape is: a field step requires a map and an index step a list.
    pub(crate) fn resolve_path(&self, path: &Path) -> crate::Result<Value> {
        let mut current = &self.root;

        for seg in &path.segments {
            match current {
                Value::Map(map) => match map.get(&seg.name) {
                    Some(v) => current = v,
                    None => {
                        trace!("path {path} stopped at missing field '{}'", seg.name);
                        return Ok(Value::Null);
                    }
                },
                _ => return Err(Error::CannotAccessField(seg.name.clone(), path.span)),
            }

            if let Some(index) = &seg.index {
                let i = match index {
                    Index::Num(i) => *i,
                    Index::Tag(tag) => match self.tags.get(tag) {
                        Some(i) => *i,
                        None => return Err(Error::UnresolvedTag(tag.clone(), path.span)),
                    },
                };

                match current {
                    Value::List(items) => match items.get(i) {
                        Some(v) => current = v,
                        None => {
                            trace!("path {path} stopped at out-of-bounds index {i}");
                            return Ok(Value::Null);
                        }
                    },
                    _ => return Err(Error::CannotIndex(seg.name.clone(), path.span)),
                }
            }
        }

        trace!("resolved path {path} to {current}");
        Ok(current.clone())
    }
}
