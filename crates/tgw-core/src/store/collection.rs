use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::{errors::Error, Result};

/// A stored JSON object. Every document carries its key under `_id`.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Field-equality query with optional ordering and limit.
#[derive(Clone, Debug)]
pub struct Query {
    field: String,
    value: Value,
    order_by: Option<(String, Order)>,
    limit: Option<usize>,
}

impl Query {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            order_by: None,
            limit: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Ids grouped by the JSON text of one field's value (missing reads as `null`).
type FieldIndex = HashMap<String, BTreeSet<i64>>;

fn index_key(v: Option<&Value>) -> String {
    v.unwrap_or(&Value::Null).to_string()
}

#[derive(Debug)]
struct State {
    next_id: i64,
    ids: BTreeSet<i64>,
    /// Built on the first query by a field, then kept current by every write.
    indexes: HashMap<String, FieldIndex>,
}

impl State {
    /// Record a write that already reached disk.
    fn commit(&mut self, id: i64, old: Option<&Document>, new: &Document) {
        self.ids.insert(id);
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        for (field, idx) in &mut self.indexes {
            if let Some(old) = old {
                let key = index_key(old.get(field));
                if let Some(set) = idx.get_mut(&key) {
                    set.remove(&id);
                    if set.is_empty() {
                        idx.remove(&key);
                    }
                }
            }
            idx.entry(index_key(new.get(field)))
                .or_default()
                .insert(id);
        }
    }
}

/// One collection of the embedded document store.
///
/// Each document is its own file, `<dir>/<name>/<_id>.json`, so a write costs
/// the same however large the collection grows. Opening only lists the ids;
/// documents are read from disk when a lookup needs them.
#[derive(Debug)]
pub struct DocumentStore {
    name: String,
    dir: PathBuf,
    state: Mutex<State>,
}

impl DocumentStore {
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        let dir = root.join(name);
        fs::create_dir_all(&dir)?;

        let mut ids = BTreeSet::new();
        for entry in fs::read_dir(&dir)? {
            let file_name = entry?.file_name();
            // Leftover `<id>.json.tmp` files from an interrupted write are skipped.
            let id = file_name
                .to_str()
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<i64>().ok());
            if let Some(id) = id {
                ids.insert(id);
            }
        }
        let next_id = ids.last().map_or(1, |max| (max + 1).max(1));

        Ok(Self {
            name: name.to_string(),
            dir,
            state: Mutex::new(State {
                next_id,
                ids,
                indexes: HashMap::new(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.ids.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Insert with an auto-increment `_id`; any `_id` in `doc` is replaced.
    pub fn insert(&self, mut doc: Document) -> Result<i64> {
        let mut st = self.lock()?;
        let id = st.next_id;
        doc.insert(ID_FIELD.to_string(), Value::from(id));
        self.write(id, &doc)?;
        st.commit(id, None, &doc);
        Ok(id)
    }

    pub fn insert_as<T: Serialize>(&self, value: &T) -> Result<i64> {
        self.insert(to_document(value)?)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Document>> {
        let st = self.lock()?;
        if !st.ids.contains(&id) {
            return Ok(None);
        }
        self.read(id).map(Some)
    }

    pub fn find_by(&self, query: &Query) -> Result<Vec<Document>> {
        let mut st = self.lock()?;
        let candidates: Vec<i64> = self
            .index(&mut st, &query.field)?
            .get(&index_key(Some(&query.value)))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let limit = query.limit.unwrap_or(usize::MAX);

        let Some((field, order)) = &query.order_by else {
            return candidates
                .into_iter()
                .take(limit)
                .map(|id| self.read(id))
                .collect();
        };

        let mut hits = candidates
            .into_iter()
            .map(|id| self.read(id))
            .collect::<Result<Vec<_>>>()?;
        hits.sort_by(|a, b| {
            let ord = compare_values(a.get(field), b.get(field))
                .then_with(|| compare_values(a.get(ID_FIELD), b.get(ID_FIELD)));
            match order {
                Order::Asc => ord,
                Order::Desc => ord.reverse(),
            }
        });
        hits.truncate(limit);
        Ok(hits)
    }

    pub fn find_one_by(&self, field: &str, value: impl Into<Value>) -> Result<Option<Document>> {
        Ok(self
            .find_by(&Query::eq(field, value).limit(1))?
            .into_iter()
            .next())
    }

    /// Merge `fields` into the document `id`. Returns false if it does not exist.
    pub fn update_by_id(&self, id: i64, fields: Document) -> Result<bool> {
        let mut st = self.lock()?;
        if !st.ids.contains(&id) {
            return Ok(false);
        }
        let old = self.read(id)?;
        let mut new = old.clone();
        for (k, v) in fields {
            if k != ID_FIELD {
                new.insert(k, v);
            }
        }
        self.write(id, &new)?;
        st.commit(id, Some(&old), &new);
        Ok(true)
    }

    /// Replace the document keyed by `doc._id`, inserting it if absent.
    pub fn update_or_insert(&self, doc: Document) -> Result<i64> {
        let id = doc.get(ID_FIELD).and_then(Value::as_i64).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "update_or_insert into {} needs a numeric _id",
                self.name
            ))
        })?;

        let mut st = self.lock()?;
        // The previous version only matters for unindexing its values.
        let old = if st.ids.contains(&id) && !st.indexes.is_empty() {
            Some(self.read(id)?)
        } else {
            None
        };
        self.write(id, &doc)?;
        st.commit(id, old.as_ref(), &doc);
        Ok(id)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::Store {
            path: self.dir.clone(),
            reason: "collection lock poisoned".to_string(),
        })
    }

    fn index<'s>(&self, st: &'s mut State, field: &str) -> Result<&'s FieldIndex> {
        if !st.indexes.contains_key(field) {
            let mut idx = FieldIndex::new();
            for &id in &st.ids {
                let doc = self.read(id)?;
                idx.entry(index_key(doc.get(field)))
                    .or_default()
                    .insert(id);
            }
            tracing::debug!(collection = %self.name, field, docs = st.ids.len(), "built field index");
            st.indexes.insert(field.to_string(), idx);
        }
        Ok(&st.indexes[field])
    }

    fn doc_path(&self, id: i64) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read(&self, id: i64) -> Result<Document> {
        let path = self.doc_path(id);
        let txt = fs::read_to_string(&path)?;
        serde_json::from_str(&txt).map_err(|e| Error::Store {
            path,
            reason: format!("corrupt document: {e}"),
        })
    }

    /// Write tmp, fsync, rename. Nothing in memory changes here.
    fn write(&self, id: i64, doc: &Document) -> Result<()> {
        let path = self.doc_path(id);
        let tmp = self.dir.join(format!("{id}.json.tmp"));
        let bytes = serde_json::to_vec(doc)?;

        if let Err(e) = write_synced(&tmp, &path, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Store {
                path,
                reason: format!("write failed: {e}"),
            });
        }
        Ok(())
    }
}

fn write_synced(tmp: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(tmp, path)
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidArgument(format!(
            "documents must be JSON objects, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
