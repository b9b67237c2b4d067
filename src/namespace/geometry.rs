//! Multi-polygon geometry in well-known text.
//!
//! Textual form: an optional `SRID=<n>;` prefix followed by
//! `MULTIPOLYGON(((x y, x y, ...), ...), ...)` or `MULTIPOLYGON EMPTY`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing geometry text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid geometry at offset {offset}: {reason}")]
pub struct GeometryError {
    pub offset: usize,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Closed ring of points
pub type Ring = Vec<Point>;

/// Outer ring followed by any holes
pub type Polygon = Vec<Ring>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiPolygon {
    /// Spatial reference id
    pub srid: Option<i32>,
    pub polygons: Vec<Polygon>,
}

struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn err<T>(&self, reason: &'static str) -> Result<T, GeometryError> {
        Err(GeometryError {
            offset: self.pos,
            reason,
        })
    }

    fn rest(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char, reason: &'static str) -> Result<(), GeometryError> {
        if self.eat(c) {
            Ok(())
        } else {
            self.err(reason)
        }
    }

    /// Consume a keyword, ignoring ASCII case.
    fn keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if rest.len() >= kw.len() && rest.is_char_boundary(kw.len()) && rest[..kw.len()].eq_ignore_ascii_case(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn token(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest.find(|c: char| !accept(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn number(&mut self) -> Result<f64, GeometryError> {
        let tok = self.token(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        match tok.parse() {
            Ok(v) => Ok(v),
            Err(_) => self.err("expected number"),
        }
    }

    fn point(&mut self) -> Result<Point, GeometryError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Point { x, y })
    }

    /// Parse a parenthesized, comma-separated list.
    fn list<T>(
        &mut self,
        item: impl Fn(&mut Self) -> Result<T, GeometryError>,
    ) -> Result<Vec<T>, GeometryError> {
        self.expect('(', "expected '('")?;
        let mut items = vec![item(self)?];
        while self.eat(',') {
            items.push(item(self)?);
        }
        self.expect(')', "expected ')'")?;
        Ok(items)
    }

    fn ring(&mut self) -> Result<Ring, GeometryError> {
        self.list(Self::point)
    }

    fn polygon(&mut self) -> Result<Polygon, GeometryError> {
        self.list(Self::ring)
    }
}

impl FromStr for MultiPolygon {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cur = Cursor { s, pos: 0 };
        let mut srid = None;
        if cur.keyword("SRID") {
            cur.expect('=', "expected '=' after SRID")?;
            let tok = cur.token(|c| c.is_ascii_digit() || c == '-');
            srid = match tok.parse() {
                Ok(v) => Some(v),
                Err(_) => return cur.err("expected SRID value"),
            };
            cur.expect(';', "expected ';' after SRID")?;
        }
        if !cur.keyword("MULTIPOLYGON") {
            return cur.err("expected MULTIPOLYGON");
        }
        let polygons = if cur.keyword("EMPTY") {
            Vec::new()
        } else {
            cur.list(Cursor::polygon)?
        };
        cur.skip_ws();
        if !cur.rest().is_empty() {
            return cur.err("trailing characters");
        }
        Ok(MultiPolygon { srid, polygons })
    }
}

fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    item: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, it) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        item(f, it)?;
    }
    f.write_str(")")
}

impl fmt::Display for MultiPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(srid) = self.srid {
            write!(f, "SRID={srid};")?;
        }
        f.write_str("MULTIPOLYGON")?;
        if self.polygons.is_empty() {
            return f.write_str(" EMPTY");
        }
        write_list(f, &self.polygons, |f, poly| {
            write_list(f, poly, |f, ring| {
                write_list(f, ring, |f, p| write!(f, "{} {}", p.x, p.y))
            })
        })
    }
}
