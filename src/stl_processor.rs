use crate::error::LoadError;
use crate::vertex::RawVertex;
use log::debug;
use std::fs;
use std::path::Path;

/// Fixed 80-byte header at the start of a binary STL.
const HEADER_SIZE: usize = 80;

/// One binary triangle record: 12-byte normal, three 12-byte vertices,
/// 2-byte attribute count.
const RECORD_SIZE: usize = 50;

/// Parse strategy decided by peeking at the start of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ascii,
    Binary { confusing: bool },
}

/// Output of a parse: the flat triangle-corner stream, each corner tagged
/// with its position in the stream, plus whether a binary file carried a
/// misleading `solid `-prefixed header.
#[derive(Debug)]
pub struct ParsedStl {
    pub raw_vertices: Vec<RawVertex>,
    pub confusing: bool,
}

pub struct StlProcessor;

impl StlProcessor {
    /// Read an STL file and parse it into the flat corner stream.
    ///
    /// The whole file is read into memory once; sniffing and parsing both
    /// work on the in-memory bytes, so the chosen parser always starts from
    /// offset zero.
    pub fn read_stl(filename: &Path) -> Result<ParsedStl, LoadError> {
        let bytes = fs::read(filename).map_err(|source| LoadError::MissingFile {
            path: filename.to_path_buf(),
            source,
        })?;
        Self::parse(&bytes)
    }

    /// Parse STL content already in memory.
    pub fn parse(bytes: &[u8]) -> Result<ParsedStl, LoadError> {
        match Self::sniff(bytes) {
            Format::Ascii => {
                debug!("detected ASCII STL");
                let raw_vertices = Self::parse_ascii(bytes)?;
                Ok(ParsedStl {
                    raw_vertices,
                    confusing: false,
                })
            }
            Format::Binary { confusing } => {
                debug!("detected binary STL (confusing header: {})", confusing);
                let raw_vertices = Self::parse_binary(bytes)?;
                Ok(ParsedStl {
                    raw_vertices,
                    confusing,
                })
            }
        }
    }

    /// Decide ASCII vs binary by peeking at the first bytes.
    ///
    /// A file starting with the literal `solid ` is only committed to the
    /// ASCII parser when the line after the solid name line looks like ASCII
    /// STL content. Binary files are allowed to carry such a header; they
    /// parse as binary and get flagged as confusing. This is the same
    /// heuristic the desktop viewers use and it can be fooled by crafted
    /// files; do not tighten it without changing what such files load as.
    fn sniff(bytes: &[u8]) -> Format {
        if !bytes.starts_with(b"solid ") {
            return Format::Binary { confusing: false };
        }
        let mut lines = bytes.split(|&b| b == b'\n');
        lines.next(); // the "solid <name>" line
        let second = String::from_utf8_lossy(lines.next().unwrap_or(&[]));
        let second = second.trim();
        if second.starts_with("facet") || second.starts_with("endsolid") {
            Format::Ascii
        } else {
            Format::Binary { confusing: true }
        }
    }

    /// Parse the fixed binary layout: 80-byte header, u32-LE triangle count,
    /// then `tri_count` 50-byte records.
    fn parse_binary(bytes: &[u8]) -> Result<Vec<RawVertex>, LoadError> {
        if bytes.len() < HEADER_SIZE + 4 {
            return Err(LoadError::BadStl(format!(
                "file is too short for a binary STL header ({} < {} bytes)",
                bytes.len(),
                HEADER_SIZE + 4
            )));
        }
        let tri_count = u32::from_le_bytes([
            bytes[HEADER_SIZE],
            bytes[HEADER_SIZE + 1],
            bytes[HEADER_SIZE + 2],
            bytes[HEADER_SIZE + 3],
        ]);

        // Widened to u64 so a corrupt triangle count cannot overflow the
        // size check.
        let expected = (HEADER_SIZE as u64 + 4) + u64::from(tri_count) * RECORD_SIZE as u64;
        if bytes.len() as u64 != expected {
            return Err(LoadError::BadStl(format!(
                "file size {} does not match {} declared triangles (expected {})",
                bytes.len(),
                tri_count,
                expected
            )));
        }

        let mut raw = Vec::with_capacity(tri_count as usize * 3);
        for record in bytes[HEADER_SIZE + 4..].chunks_exact(RECORD_SIZE) {
            // Skip the normal (bytes 0..12) and the attribute count (48..50).
            for corner in record[12..48].chunks_exact(12) {
                let index = raw.len() as u32;
                raw.push(RawVertex::new(read_vec3(corner), index));
            }
        }
        debug!("binary STL: {} triangles", tri_count);
        Ok(raw)
    }

    /// Line-oriented parser for the ASCII STL grammar. Whitespace-tolerant,
    /// keyword-strict: any structural deviation aborts with `BadStl`.
    fn parse_ascii(bytes: &[u8]) -> Result<Vec<RawVertex>, LoadError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| LoadError::BadStl("ASCII STL contains invalid UTF-8".to_string()))?;
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

        match lines.next() {
            Some(line) if line.starts_with("solid") => {}
            _ => {
                return Err(LoadError::BadStl(
                    "expected \"solid\" at the start of the file".to_string(),
                ))
            }
        }

        let mut raw = Vec::new();
        loop {
            let line = lines.next().ok_or_else(unexpected_eof)?;
            if line.starts_with("endsolid") {
                break;
            }

            let mut tokens = line.split_whitespace();
            if tokens.next() != Some("facet") || tokens.next() != Some("normal") {
                return Err(LoadError::BadStl(format!(
                    "expected \"facet normal\", got \"{line}\""
                )));
            }
            // The normal values are discarded, but they still have to parse.
            parse_vec3(tokens, line)?;

            expect_keywords(&mut lines, &["outer", "loop"])?;
            for _ in 0..3 {
                let line = lines.next().ok_or_else(unexpected_eof)?;
                let mut tokens = line.split_whitespace();
                if tokens.next() != Some("vertex") {
                    return Err(LoadError::BadStl(format!(
                        "expected \"vertex\", got \"{line}\""
                    )));
                }
                let position = parse_vec3(tokens, line)?;
                let index = raw.len() as u32;
                raw.push(RawVertex::new(position, index));
            }
            expect_keywords(&mut lines, &["endloop"])?;
            expect_keywords(&mut lines, &["endfacet"])?;
        }

        debug!("ASCII STL: {} triangles", raw.len() / 3);
        Ok(raw)
    }
}

fn read_vec3(buf: &[u8]) -> [f32; 3] {
    let x = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let y = f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let z = f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    [x, y, z]
}

fn unexpected_eof() -> LoadError {
    LoadError::BadStl("unexpected end of file before \"endsolid\"".to_string())
}

fn expect_keywords<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    keywords: &[&str],
) -> Result<(), LoadError> {
    let line = lines.next().ok_or_else(unexpected_eof)?;
    let mut tokens = line.split_whitespace();
    for &keyword in keywords {
        if tokens.next() != Some(keyword) {
            return Err(LoadError::BadStl(format!(
                "expected \"{}\", got \"{line}\"",
                keywords.join(" ")
            )));
        }
    }
    Ok(())
}

fn parse_vec3<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: &str,
) -> Result<[f32; 3], LoadError> {
    let mut out = [0.0f32; 3];
    for value in &mut out {
        let token = tokens
            .next()
            .ok_or_else(|| LoadError::BadStl(format!("missing coordinate in \"{line}\"")))?;
        *value = token
            .parse()
            .map_err(|_| LoadError::BadStl(format!("bad coordinate \"{token}\" in \"{line}\"")))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Builds a well-formed binary STL from triangles of [f32; 9].
    fn binary_stl(header: &[u8; 80], triangles: &[[f32; 9]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(header);
        bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            for _ in 0..3 {
                bytes.extend_from_slice(&0.0f32.to_le_bytes()); // normal
            }
            for value in tri {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            bytes.extend_from_slice(&0u16.to_le_bytes()); // attribute
        }
        bytes
    }

    fn positions(raw: &[RawVertex]) -> Vec<[f32; 3]> {
        raw.iter().map(|v| v.position).collect()
    }

    #[test]
    fn test_binary_parse_preserves_corner_order() {
        let bytes = binary_stl(
            &[0u8; 80],
            &[[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]],
        );
        let parsed = StlProcessor::parse(&bytes).unwrap();

        assert!(!parsed.confusing);
        assert_eq!(
            positions(&parsed.raw_vertices),
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        );
        for (i, v) in parsed.raw_vertices.iter().enumerate() {
            assert_eq!(v.original_index, i as u32);
        }
    }

    #[test]
    fn test_binary_size_mismatch_is_bad_stl() {
        let mut bytes = binary_stl(
            &[0u8; 80],
            &[[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]],
        );
        bytes.pop();
        let err = StlProcessor::parse(&bytes).unwrap_err();
        assert!(matches!(err, LoadError::BadStl(_)));
    }

    #[test]
    fn test_binary_truncated_header_is_bad_stl() {
        let err = StlProcessor::parse(&[0u8; 60]).unwrap_err();
        assert!(matches!(err, LoadError::BadStl(_)));
    }

    #[test]
    fn test_binary_huge_declared_count_is_bad_stl() {
        // u32::MAX triangles would overflow a u32 size check; the widened
        // comparison has to reject it instead.
        let mut bytes = vec![0u8; 84];
        bytes[80..84].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = StlProcessor::parse(&bytes).unwrap_err();
        assert!(matches!(err, LoadError::BadStl(_)));
    }

    #[test]
    fn test_confusing_binary_header_parses_as_binary() {
        let mut header = [b' '; 80];
        header[..6].copy_from_slice(b"solid ");
        let bytes = binary_stl(&header, &[[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]]);

        let parsed = StlProcessor::parse(&bytes).unwrap();
        assert!(parsed.confusing);
        assert_eq!(parsed.raw_vertices.len(), 3);
    }

    #[test]
    fn test_ascii_parse() {
        let stl = b"solid cube corner
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid cube corner
";
        let parsed = StlProcessor::parse(stl).unwrap();
        assert!(!parsed.confusing);
        assert_eq!(
            positions(&parsed.raw_vertices),
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn test_ascii_is_whitespace_tolerant() {
        let stl = b"solid   name
facet   normal   0.0   0.0   1.0
outer   loop
vertex 0.5e1   -2   3.25
vertex 1 0 0
vertex 0 1 0
endloop
endfacet
endsolid name
";
        let parsed = StlProcessor::parse(stl).unwrap();
        assert_eq!(parsed.raw_vertices[0].position, [5.0, -2.0, 3.25]);
    }

    #[test]
    fn test_ascii_empty_solid_parses_to_zero_triangles() {
        let parsed = StlProcessor::parse(b"solid x\nendsolid x\n").unwrap();
        assert!(parsed.raw_vertices.is_empty());
        assert!(!parsed.confusing);
    }

    #[test]
    fn test_ascii_missing_endloop_is_bad_stl() {
        let stl = b"solid x
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
  endfacet
endsolid x
";
        let err = StlProcessor::parse(stl).unwrap_err();
        assert!(matches!(err, LoadError::BadStl(_)));
    }

    #[test]
    fn test_ascii_wrong_token_is_bad_stl() {
        let stl = b"solid x
  facet normal 0 0 1
    outer loop
      vortex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid x
";
        let err = StlProcessor::parse(stl).unwrap_err();
        assert!(matches!(err, LoadError::BadStl(_)));
    }

    #[test]
    fn test_ascii_bad_coordinate_is_bad_stl() {
        let stl = b"solid x
  facet normal 0 0 1
    outer loop
      vertex 0 zero 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid x
";
        let err = StlProcessor::parse(stl).unwrap_err();
        assert!(matches!(err, LoadError::BadStl(_)));
    }

    #[test]
    fn test_ascii_missing_endsolid_is_bad_stl() {
        let stl = b"solid x
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
";
        let err = StlProcessor::parse(stl).unwrap_err();
        assert!(matches!(err, LoadError::BadStl(_)));
    }
}
