//! In-process search engine for embedding and tests
//!
//! JSON sources live in a `DashMap`; a RAM tantivy index mirrors the searchable
//! fields of every source and answers the query shapes produced by
//! [`QueryBuilder`](crate::search::QueryBuilder). Field sorts are applied to the
//! stored sources after retrieval.

use crate::search::engine::{EngineHit, EngineSearchResponse, SearchEngine};
use crate::search::error::{SearchError, SearchResult};
use crate::search::query::{Query, QuerySpec, SortOrder, FREE_TEXT_FIELDS};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, EmptyQuery, Occur, Query as TantivyQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value as _, STORED, STRING, TEXT};
use tantivy::tokenizer::TokenStream;
use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, Snippet, SnippetGenerator, TantivyDocument,
    Term,
};

/// Writer heap for the single indexing thread
const WRITER_HEAP_BYTES: usize = 50_000_000;

const KEY_FIELD: &str = "_key";
const SCOPE_FIELD: &str = "_scope";

/// Searchable fields beyond the free-text set
const EXTRA_TEXT_FIELDS: [&str; 1] = ["documents.documentNumber"];

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    source: Value,
}

/// RAM tantivy index keyed by `{index}/{type}/{id}`
struct LocalIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    key_field: Field,
    scope_field: Field,
    text_fields: Vec<(&'static str, Field)>,
}

impl LocalIndex {
    fn create() -> SearchResult<Self> {
        let mut builder = Schema::builder();
        let key_field = builder.add_text_field(KEY_FIELD, STRING | STORED);
        let scope_field = builder.add_text_field(SCOPE_FIELD, STRING);

        let mut text_fields = Vec::new();
        for name in FREE_TEXT_FIELDS.iter().chain(EXTRA_TEXT_FIELDS.iter()) {
            // Dots would read as JSON paths in tantivy field names
            let field = builder.add_text_field(&name.replace('.', "_"), TEXT);
            text_fields.push((*name, field));
        }

        let index = Index::create_in_ram(builder.build());
        let writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            key_field,
            scope_field,
            text_fields,
        })
    }

    fn text_field(&self, name: &str) -> Option<Field> {
        self.text_fields
            .iter()
            .find(|(field_name, _)| *field_name == name)
            .map(|(_, field)| *field)
    }

    /// Replace the indexed copy of `key` with the fields of `source`
    fn write(&self, key: &str, scope: &str, source: &Value) -> SearchResult<()> {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.key_field, key);
        doc.add_text(self.scope_field, scope);
        for (name, field) in &self.text_fields {
            for text in leaf_strings(source, name) {
                doc.add_text(*field, &text);
            }
        }

        {
            let mut writer = self.writer.lock();
            writer.delete_term(Term::from_field_text(self.key_field, key));
            writer.add_document(doc)?;
            writer.commit()?;
        }
        self.reader.reload()?;
        Ok(())
    }

    /// Terms of `text` as the field's analyzer emits them
    fn analyze(&self, field: Field, text: &str) -> SearchResult<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        Ok(terms)
    }

    /// Analyzed `text` on one field; `occur` joins the terms
    fn text_query(&self, name: &str, text: &str, occur: Occur) -> SearchResult<Box<dyn TantivyQuery>> {
        let Some(field) = self.text_field(name) else {
            return Ok(Box::new(EmptyQuery));
        };

        let mut clauses: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
        for term in self.analyze(field, text)? {
            clauses.push((
                occur,
                Box::new(TermQuery::new(
                    Term::from_field_text(field, &term),
                    IndexRecordOption::WithFreqs,
                )),
            ));
        }
        Ok(boolean(clauses))
    }

    fn translate(&self, query: &Query) -> SearchResult<Box<dyn TantivyQuery>> {
        let mut clauses: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
        match query {
            Query::Match { field, value } => return self.text_query(field, value, Occur::Should),
            Query::MultiMatch { query, fields } => {
                for field in fields {
                    clauses.push((Occur::Should, self.text_query(field, query, Occur::Should)?));
                }
            }
            Query::Terms { field, values } => {
                for value in values {
                    clauses.push((Occur::Should, self.text_query(field, value, Occur::Must)?));
                }
            }
            Query::Bool { must, should } => {
                for clause in must {
                    clauses.push((Occur::Must, self.translate(clause)?));
                }
                for clause in should {
                    clauses.push((Occur::Should, self.translate(clause)?));
                }
            }
        }
        Ok(boolean(clauses))
    }

    /// `query` restricted to one index and document type
    fn scoped(&self, scope: &str, query: &Query) -> SearchResult<BooleanQuery> {
        let mut clauses: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
        clauses.push((
            Occur::Must,
            Box::new(TermQuery::new(
                Term::from_field_text(self.scope_field, scope),
                IndexRecordOption::Basic,
            )),
        ));
        clauses.push((Occur::Must, self.translate(query)?));
        Ok(BooleanQuery::new(clauses))
    }
}

fn boolean(mut clauses: Vec<(Occur, Box<dyn TantivyQuery>)>) -> Box<dyn TantivyQuery> {
    if clauses.len() == 1 {
        if let Some((_, query)) = clauses.pop() {
            return query;
        }
    }
    if clauses.is_empty() {
        Box::new(EmptyQuery)
    } else {
        Box::new(BooleanQuery::new(clauses))
    }
}

/// Snippet text with matched ranges wrapped in `<em>`; `None` without a match
fn render_snippet(snippet: &Snippet) -> Option<String> {
    if snippet.highlighted().is_empty() {
        return None;
    }

    let fragment = snippet.fragment();
    let mut out = String::with_capacity(fragment.len() + 16);
    let mut cursor = 0;
    for range in snippet.highlighted() {
        out.push_str(&fragment[cursor..range.start]);
        out.push_str("<em>");
        out.push_str(&fragment[range.clone()]);
        out.push_str("</em>");
        cursor = range.end;
    }
    out.push_str(&fragment[cursor..]);
    Some(out)
}

/// In-memory engine (for embedding and testing)
#[derive(Clone)]
pub struct InMemoryEngine {
    indices: Arc<DashSet<String>>,
    documents: Arc<DashMap<String, StoredDocument>>,
    local: Arc<LocalIndex>,
}

impl InMemoryEngine {
    pub fn new() -> SearchResult<Self> {
        Ok(Self {
            indices: Arc::new(DashSet::new()),
            documents: Arc::new(DashMap::new()),
            local: Arc::new(LocalIndex::create()?),
        })
    }

    fn key(index: &str, doc_type: &str, id: &str) -> String {
        format!("{}/{}/{}", index, doc_type, id)
    }

    fn scope(index: &str, doc_type: &str) -> String {
        format!("{}/{}", index, doc_type)
    }

    /// Number of stored documents across all indices
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Whether `index` has been created
    pub fn has_index(&self, index: &str) -> bool {
        self.indices.contains(index)
    }
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn ping(&self) -> SearchResult<()> {
        Ok(())
    }

    async fn ensure_index(&self, index: &str) -> SearchResult<()> {
        self.indices.insert(index.to_string());
        Ok(())
    }

    async fn exists(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<bool> {
        Ok(self.documents.contains_key(&Self::key(index, doc_type, id)))
    }

    async fn get(&self, index: &str, doc_type: &str, id: &str) -> SearchResult<Option<Value>> {
        Ok(self
            .documents
            .get(&Self::key(index, doc_type, id))
            .map(|entry| entry.source.clone()))
    }

    async fn create(&self, index: &str, doc_type: &str, id: &str, body: &Value) -> SearchResult<()> {
        self.indices.insert(index.to_string());

        let key = Self::key(index, doc_type, id);
        match self.documents.entry(key.clone()) {
            Entry::Occupied(mut existing) => {
                self.local.write(&key, &Self::scope(index, doc_type), body)?;
                existing.get_mut().source = body.clone();
            }
            Entry::Vacant(vacant) => {
                self.local.write(&key, &Self::scope(index, doc_type), body)?;
                vacant.insert(StoredDocument {
                    id: id.to_string(),
                    source: body.clone(),
                });
            }
        }
        Ok(())
    }

    async fn partial_update(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> SearchResult<()> {
        let key = Self::key(index, doc_type, id);
        let mut entry = self
            .documents
            .get_mut(&key)
            .ok_or_else(|| SearchError::Request(format!("document missing: {}", id)))?;

        let merged = merged_with(&entry.source, field, value);
        self.local.write(&key, &Self::scope(index, doc_type), &merged)?;
        entry.source = merged;
        Ok(())
    }

    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        field: &str,
        value: &Value,
        body: &Value,
    ) -> SearchResult<()> {
        self.indices.insert(index.to_string());

        let key = Self::key(index, doc_type, id);
        let scope = Self::scope(index, doc_type);

        // The entry guard holds the shard lock across the index write, so
        // check-merge-write is atomic per key
        match self.documents.entry(key.clone()) {
            Entry::Occupied(mut existing) => {
                let merged = merged_with(&existing.get().source, field, value);
                self.local.write(&key, &scope, &merged)?;
                existing.get_mut().source = merged;
            }
            Entry::Vacant(vacant) => {
                self.local.write(&key, &scope, body)?;
                vacant.insert(StoredDocument {
                    id: id.to_string(),
                    source: body.clone(),
                });
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        doc_type: &str,
        spec: &QuerySpec,
    ) -> SearchResult<EngineSearchResponse> {
        let local = &self.local;
        let query = local.scoped(&Self::scope(index, doc_type), &spec.query)?;
        let searcher = local.reader.searcher();

        let count = searcher.search(&query, &Count)?;
        let mut matched: Vec<(f64, StoredDocument)> = Vec::with_capacity(count);
        if count > 0 {
            for (score, address) in searcher.search(&query, &TopDocs::with_limit(count))? {
                let doc: TantivyDocument = searcher.doc(address)?;
                let Some(key) = doc.get_first(local.key_field).and_then(|v| v.as_str()) else {
                    continue;
                };
                if let Some(stored) = self.documents.get(key) {
                    matched.push((score as f64, stored.value().clone()));
                }
            }
        }

        match &spec.sort {
            Some(sort) => matched.sort_by(|(_, a), (_, b)| {
                compare_for_sort(&a.source, &b.source, &sort.field, sort.order)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            None => matched.sort_by(|(sa, a), (sb, b)| {
                sb.partial_cmp(sa)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }

        let total_hits = matched.len() as u64;

        let mut generators = Vec::new();
        for name in &spec.highlight_fields {
            if let Some(field) = local.text_field(name) {
                generators.push((name, SnippetGenerator::create(&searcher, &query, field)?));
            }
        }

        let hits = matched
            .into_iter()
            .skip(spec.from)
            .take(spec.size)
            .map(|(score, doc)| {
                let highlight = generators
                    .iter()
                    .filter_map(|(name, generator)| {
                        let fragments: Vec<String> = leaf_strings(&doc.source, name)
                            .iter()
                            .filter_map(|text| render_snippet(&generator.snippet(text)))
                            .collect();
                        (!fragments.is_empty()).then(|| (name.to_string(), fragments))
                    })
                    .collect();

                EngineHit {
                    id: doc.id,
                    score: if spec.sort.is_some() { None } else { Some(score) },
                    source: doc.source.as_object().cloned().unwrap_or_default(),
                    highlight,
                }
            })
            .collect();

        Ok(EngineSearchResponse { hits, total_hits })
    }
}

fn merged_with(source: &Value, field: &str, value: &Value) -> Value {
    let mut merged = source.clone();
    if let Some(object) = merged.as_object_mut() {
        object.insert(field.to_string(), value.clone());
    }
    merged
}

/// All scalar values under a dotted field path, descending through arrays.
/// A path naming an object collects every scalar beneath it.
fn leaf_strings(source: &Value, field: &str) -> Vec<String> {
    fn walk(value: &Value, path: &[&str], out: &mut Vec<String>) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| walk(item, path, out)),
            Value::Object(map) => match path.split_first() {
                Some((head, rest)) => {
                    if let Some(child) = map.get(*head) {
                        walk(child, rest, out);
                    }
                }
                None => map.values().for_each(|child| walk(child, path, out)),
            },
            Value::String(s) if path.is_empty() => out.push(s.clone()),
            Value::Number(n) if path.is_empty() => out.push(n.to_string()),
            Value::Bool(b) if path.is_empty() => out.push(b.to_string()),
            _ => {}
        }
    }

    let path: Vec<&str> = field.split('.').collect();
    let mut out = Vec::new();
    walk(source, &path, &mut out);
    out
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey {
    Number(f64),
    Text(String),
}

fn sort_key(source: &Value, field: &str) -> Option<SortKey> {
    let mut current = source;
    for part in field.split('.') {
        current = match current {
            Value::Array(items) => items.first()?.get(part)?,
            other => other.get(part)?,
        };
    }
    match current {
        Value::Number(n) => n.as_f64().map(SortKey::Number),
        Value::String(s) => Some(SortKey::Text(s.to_lowercase())),
        Value::Bool(b) => Some(SortKey::Number(if *b { 1.0 } else { 0.0 })),
        _ => None,
    }
}

/// Missing values sort last in either direction
fn compare_for_sort(a: &Value, b: &Value, field: &str, order: SortOrder) -> Ordering {
    match (sort_key(a, field), sort_key(b, field)) {
        (Some(ka), Some(kb)) => {
            let ord = ka.partial_cmp(&kb).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
