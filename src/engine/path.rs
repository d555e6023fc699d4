//! Property paths.
//!
//! A [`PropertyPath`] identifies where in a validated object graph a violation occurred. It is a
//! list of nodes; each node has an optional name and an optional position (list index or map
//! key) that addresses an element of the container produced by the previous node.
//!
//! Rendered forms:
//!
//! | Path | Meaning |
//! |------|---------|
//! | `street.name` | property `name` of the bean in property `street` |
//! | `addresses[0].city` | property `city` of the first element of `addresses` |
//! | `addresses[0]` | class level constraint of the first element of `addresses` |
//! | `tags[1].<list element>` | container element constraint on the second tag |
//! | `phones[home]` | value of the map `phones` under key `home` |
//! | `save.arg0` | first parameter of `save` |
//! | `find.<return value>` | return value of `find` |
//! | `save.<cross-parameter>` | the parameter list of `save` |

use std::fmt;

use crate::{Error, Result};

/// Position of a node within the container produced by the previous node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPosition {
    /// Index into a list
    Index(usize),
    /// Key into a map
    Key(String),
    /// Element of an iterable without stable positions
    Iterable,
}

impl fmt::Display for PathPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPosition::Index(index) => write!(f, "[{index}]"),
            PathPosition::Key(key) => write!(f, "[{key}]"),
            PathPosition::Iterable => f.write_str("[]"),
        }
    }
}

/// One element of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathNode {
    name: Option<String>,
    position: Option<PathPosition>,
}

impl PathNode {
    /// The node name; `None` for bean nodes.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The position inside the previous node's container.
    #[must_use]
    pub fn position(&self) -> Option<&PathPosition> {
        self.position.as_ref()
    }
}

/// Location of a value inside a validated object graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    nodes: Vec<PathNode>,
}

impl PropertyPath {
    /// The empty path of a root bean.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// The path of an executable, starting with its name.
    #[must_use]
    pub fn executable(name: &str) -> Self {
        Self::root().property(name)
    }

    /// Parses a dotted path such as `addresses[0].city` or `phones[home]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPropertyPath`] for empty segments, unbalanced brackets and
    /// positions not followed by `.` or the end of the path.
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidPropertyPath {
            path: path.to_string(),
            message: message.to_string(),
        };

        let mut parsed = PropertyPath::root();
        let mut pending: Option<PathPosition> = None;
        let mut chars = path.chars().peekable();

        if path.is_empty() {
            return Err(invalid("path is empty"));
        }

        loop {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' || c == '[' {
                    break;
                }
                if c == ']' {
                    return Err(invalid("unexpected ']'"));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(invalid("empty property name"));
            }
            parsed.nodes.push(PathNode {
                name: Some(name),
                position: pending.take(),
            });

            match chars.next() {
                None => break,
                Some('.') => continue,
                Some('[') => {
                    let mut content = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some('[') | None => return Err(invalid("unterminated '['")),
                            Some(c) => content.push(c),
                        }
                    }
                    pending = Some(match content.parse::<usize>() {
                        Ok(index) => PathPosition::Index(index),
                        Err(_) if content.is_empty() => PathPosition::Iterable,
                        Err(_) => PathPosition::Key(content),
                    });

                    match chars.next() {
                        None => {
                            parsed.nodes.push(PathNode {
                                name: None,
                                position: pending.take(),
                            });
                            break;
                        }
                        Some('.') => continue,
                        Some(_) => return Err(invalid("expected '.' after ']'")),
                    }
                }
                Some(_) => return Err(invalid("unexpected character")),
            }
        }

        Ok(parsed)
    }

    /// The nodes of the path.
    #[must_use]
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a named node. A trailing bean node is named instead, keeping its position.
    #[must_use]
    pub fn property(&self, name: &str) -> Self {
        let mut path = self.clone();
        match path.nodes.last_mut() {
            Some(last) if last.name.is_none() => last.name = Some(name.to_string()),
            _ => path.nodes.push(PathNode {
                name: Some(name.to_string()),
                position: None,
            }),
        }
        path
    }

    /// Appends an unnamed bean node at `position` of the current container.
    #[must_use]
    pub fn element(&self, position: Option<PathPosition>) -> Self {
        let mut path = self.clone();
        path.nodes.push(PathNode {
            name: None,
            position,
        });
        path
    }

    /// Appends a parameter node.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Self {
        self.property(name)
    }

    /// Appends the return value node.
    #[must_use]
    pub fn return_value(&self) -> Self {
        self.property("<return value>")
    }

    /// Appends the cross-parameter node.
    #[must_use]
    pub fn cross_parameter(&self) -> Self {
        self.property("<cross-parameter>")
    }

    /// Returns `true` if `self` is a prefix of `other`, ignoring the position of the last node
    /// of `self`.
    #[must_use]
    pub fn is_sub_path_of(&self, other: &PropertyPath) -> bool {
        if self.nodes.len() > other.nodes.len() {
            return false;
        }
        self.nodes
            .iter()
            .zip(&other.nodes)
            .enumerate()
            .all(|(i, (mine, theirs))| {
                if i + 1 == self.nodes.len() {
                    mine.name == theirs.name
                } else {
                    mine == theirs
                }
            })
    }

    /// The name of the last named node.
    #[must_use]
    pub fn leaf_name(&self) -> Option<&str> {
        self.nodes.iter().rev().find_map(PathNode::name)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in &self.nodes {
            if let Some(position) = &node.position {
                write!(f, "{position}")?;
            }
            if let Some(name) = &node.name {
                if !first {
                    f.write_str(".")?;
                }
                f.write_str(name)?;
            }
            first = false;
        }
        Ok(())
    }
}
