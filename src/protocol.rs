//! Line protocol spoken by the database process on its standard input.
//!
//! ```text
//! insert <key> <f1> <f2> ... <fn>
//! search <f1> ... <fn> --k_top <k>
//! exit
//! ```
//!
//! Fields are separated by single spaces and every line ends with `\n`.
//! Floats use Rust's shortest round-trip decimal form, so the receiver parses
//! back the exact same `f32`.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{BenchError, Result};

pub const K_TOP_FLAG: &str = "--k_top";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Insert { key: String, vector: Vec<f32> },
    Search { vector: Vec<f32>, k_top: usize },
    Exit,
}

impl Command {
    /// Render as one newline-terminated protocol line.
    pub fn encode(&self) -> Result<String> {
        match self {
            Command::Insert { key, vector } => encode_insert(key, vector),
            Command::Search { vector, k_top } => encode_search(vector, *k_top),
            Command::Exit => Ok(encode_exit()),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode_insert(key: &str, vector: &[f32]) -> Result<String> {
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(BenchError::Encoding(format!(
            "key {:?} must be non-empty and contain no whitespace",
            key
        )));
    }
    let mut line = String::with_capacity(8 + key.len() + vector.len() * 12);
    line.push_str("insert ");
    line.push_str(key);
    push_floats(&mut line, vector)?;
    line.push('\n');
    Ok(line)
}

pub fn encode_search(vector: &[f32], k_top: usize) -> Result<String> {
    if k_top == 0 {
        return Err(BenchError::Encoding("k_top must be positive".into()));
    }
    let mut line = String::with_capacity(24 + vector.len() * 12);
    line.push_str("search");
    push_floats(&mut line, vector)?;
    let _ = writeln!(line, " {} {}", K_TOP_FLAG, k_top);
    Ok(line)
}

pub fn encode_exit() -> String {
    "exit\n".to_string()
}

fn push_floats(line: &mut String, vector: &[f32]) -> Result<()> {
    if vector.is_empty() {
        return Err(BenchError::Encoding("vector must not be empty".into()));
    }
    for x in vector {
        if !x.is_finite() {
            return Err(BenchError::Encoding(format!("non-finite component {}", x)));
        }
        let _ = write!(line, " {}", x);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Inverse of [`Command::encode`]. Accepts a line with or without its
/// trailing newline.
pub fn parse_line(line: &str) -> Result<Command> {
    let mut fields = line.split_whitespace();
    let verb = fields
        .next()
        .ok_or_else(|| BenchError::Encoding("empty line".into()))?;
    let rest: Vec<&str> = fields.collect();

    match verb {
        "insert" => {
            let (key, values) = rest
                .split_first()
                .ok_or_else(|| BenchError::Encoding("insert requires a key".into()))?;
            let vector = parse_floats(values)?;
            Ok(Command::Insert {
                key: key.to_string(),
                vector,
            })
        }
        "search" => {
            let n = rest.len();
            if n < 3 || rest[n - 2] != K_TOP_FLAG {
                return Err(BenchError::Encoding(format!(
                    "search requires a vector followed by {} <k>",
                    K_TOP_FLAG
                )));
            }
            let k_top = rest[n - 1]
                .parse::<usize>()
                .map_err(|e| BenchError::Encoding(format!("invalid k_top: {}", e)))?;
            let vector = parse_floats(&rest[..n - 2])?;
            Ok(Command::Search { vector, k_top })
        }
        "exit" if rest.is_empty() => Ok(Command::Exit),
        other => Err(BenchError::Encoding(format!("unknown command: {}", other))),
    }
}

fn parse_floats(values: &[&str]) -> Result<Vec<f32>> {
    if values.is_empty() {
        return Err(BenchError::Encoding("vector must not be empty".into()));
    }
    values
        .iter()
        .map(|s| {
            s.parse::<f32>()
                .map_err(|e| BenchError::Encoding(format!("bad component {:?}: {}", s, e)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Workload batches
// ---------------------------------------------------------------------------

/// An ordered command stream terminated by `exit`, fed to one process.
#[derive(Debug, Clone)]
pub struct WorkloadBatch {
    text: Arc<str>,
    inserts: usize,
    searches: usize,
}

impl WorkloadBatch {
    pub fn builder() -> WorkloadBuilder {
        WorkloadBuilder {
            text: String::new(),
            inserts: 0,
            searches: 0,
        }
    }

    /// `vec_0 .. vec_{n-1}` inserts followed by `exit`.
    pub fn insert_only(vectors: &[Vec<f32>]) -> Result<Self> {
        let mut builder = Self::builder();
        builder.inserts(vectors)?;
        Ok(builder.finish())
    }

    /// The insert-only stream with `queries` searches spliced in before `exit`.
    pub fn insert_then_search(
        vectors: &[Vec<f32>],
        queries: &[Vec<f32>],
        k_top: usize,
    ) -> Result<Self> {
        let mut builder = Self::builder();
        builder.inserts(vectors)?;
        for query in queries {
            builder.search(query, k_top)?;
        }
        Ok(builder.finish())
    }

    /// The full stream, exactly as written to the child's stdin.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Shared handle to the stream, for a writer that may outlive the caller.
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts
    }

    pub fn search_count(&self) -> usize {
        self.searches
    }

    /// Including the terminating `exit`.
    pub fn command_count(&self) -> usize {
        self.inserts + self.searches + 1
    }
}

pub struct WorkloadBuilder {
    text: String,
    inserts: usize,
    searches: usize,
}

impl WorkloadBuilder {
    pub fn insert(&mut self, key: &str, vector: &[f32]) -> Result<&mut Self> {
        self.text.push_str(&encode_insert(key, vector)?);
        self.inserts += 1;
        Ok(self)
    }

    /// Inserts every vector under its positional `vec_<i>` key.
    pub fn inserts(&mut self, vectors: &[Vec<f32>]) -> Result<&mut Self> {
        for (i, vector) in vectors.iter().enumerate() {
            self.insert(&crate::generator::vector_key(i), vector)?;
        }
        Ok(self)
    }

    pub fn search(&mut self, vector: &[f32], k_top: usize) -> Result<&mut Self> {
        self.text.push_str(&encode_search(vector, k_top)?);
        self.searches += 1;
        Ok(self)
    }

    pub fn finish(mut self) -> WorkloadBatch {
        self.text.push_str(&encode_exit());
        WorkloadBatch {
            text: Arc::from(self.text),
            inserts: self.inserts,
            searches: self.searches,
        }
    }
}
