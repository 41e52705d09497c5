//! In-memory FASTQ read records.
//!
//! Records are written in the `@id` / sequence / `+id` / quality form. The
//! separator line is not kept when a record is read, so it is always written as
//! `+` followed by the header: a record with a bare `+` line comes back with its
//! header repeated there, while records already in `+id` form round-trip
//! byte for byte.

use std::io::{self, Write};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed read '{read_id}': {reason}")]
pub struct MalformedReadError {
    pub read_id: String,
    pub reason: String,
}

impl MalformedReadError {
    pub(crate) fn new(read_id: &str, reason: impl Into<String>) -> Self {
        Self {
            read_id: read_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// The reverse mate of a paired read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mate {
    /// Header line from the reverse file, without the leading `@`
    pub header: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

/// A single read, or a read pair once a reverse mate is attached.
///
/// Sequence and quality always have equal length on each side; this is checked
/// whenever a side is set, so a constructed `Read` is always well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    /// Header line from the forward file, without the leading `@`
    pub header: String,
    seq: Vec<u8>,
    qual: Vec<u8>,
    reverse: Option<Mate>,
}

/// Extract the mate-pairing name from a FASTQ header.
///
/// The name is the header up to the first whitespace, with a trailing `/1` or `/2`
/// removed, so `read7/1` and `read7/2 extra` pair with each other.
///
/// ```
/// use barcseek::core::read::read_name;
///
/// assert_eq!(read_name("M001:7:1101:1 1:N:0:ACGT"), "M001:7:1101:1");
/// assert_eq!(read_name("read7/2"), "read7");
/// ```
#[must_use]
pub fn read_name(header: &str) -> &str {
    let name = header.split_whitespace().next().unwrap_or("");
    name.strip_suffix("/1")
        .or_else(|| name.strip_suffix("/2"))
        .unwrap_or(name)
}

impl Read {
    /// Create an unpaired read.
    ///
    /// # Errors
    ///
    /// Returns `MalformedReadError` if sequence and quality lengths differ.
    pub fn new(
        header: impl Into<String>,
        seq: impl Into<Vec<u8>>,
        qual: impl Into<Vec<u8>>,
    ) -> Result<Self, MalformedReadError> {
        let header = header.into();
        let seq = seq.into();
        let qual = qual.into();
        if seq.len() != qual.len() {
            return Err(MalformedReadError::new(
                &header,
                format!(
                    "sequence length {} does not match quality length {}",
                    seq.len(),
                    qual.len()
                ),
            ));
        }
        Ok(Self {
            header,
            seq,
            qual,
            reverse: None,
        })
    }

    /// Attach the reverse mate.
    ///
    /// # Errors
    ///
    /// Returns `MalformedReadError` if the reverse sequence and quality lengths
    /// differ, or if a mate is already attached.
    pub fn add_reverse(
        &mut self,
        header: impl Into<String>,
        seq: impl Into<Vec<u8>>,
        qual: impl Into<Vec<u8>>,
    ) -> Result<(), MalformedReadError> {
        let header = header.into();
        let seq = seq.into();
        let qual = qual.into();
        if self.reverse.is_some() {
            return Err(MalformedReadError::new(
                &self.header,
                format!("reverse mate '{header}' appears more than once"),
            ));
        }
        if seq.len() != qual.len() {
            return Err(MalformedReadError::new(
                &header,
                format!(
                    "reverse sequence length {} does not match reverse quality length {}",
                    seq.len(),
                    qual.len()
                ),
            ));
        }
        self.reverse = Some(Mate { header, seq, qual });
        Ok(())
    }

    /// Name used to join mates
    pub fn name(&self) -> &str {
        read_name(&self.header)
    }

    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn qual(&self) -> &[u8] {
        &self.qual
    }

    pub fn reverse(&self) -> Option<&Mate> {
        self.reverse.as_ref()
    }

    pub fn reverse_seq(&self) -> Option<&[u8]> {
        self.reverse.as_ref().map(|m| m.seq.as_slice())
    }

    pub fn is_paired(&self) -> bool {
        self.reverse.is_some()
    }

    /// Remove the first `forward` bases (and `reverse` bases of the mate, if any).
    ///
    /// Lengths past the end of a sequence trim it to empty.
    pub fn trim_prefix(&mut self, forward: usize, reverse: Option<usize>) {
        let n = forward.min(self.seq.len());
        self.seq.drain(..n);
        self.qual.drain(..n);

        if let (Some(mate), Some(reverse)) = (self.reverse.as_mut(), reverse) {
            let n = reverse.min(mate.seq.len());
            mate.seq.drain(..n);
            mate.qual.drain(..n);
        }
    }

    /// Write the forward record as a 4-line FASTQ entry
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_forward<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_record(writer, &self.header, &self.seq, &self.qual)
    }

    /// Write the reverse record, if any, as a 4-line FASTQ entry.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_reverse<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        match &self.reverse {
            Some(mate) => write_record(writer, &mate.header, &mate.seq, &mate.qual),
            None => Ok(()),
        }
    }

    /// Forward record as FASTQ text
    pub fn to_fastq(&self) -> String {
        let mut buffer = Vec::with_capacity(2 * (self.header.len() + self.seq.len()) + 8);
        // Writing into a Vec cannot fail
        let _ = self.write_forward(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

fn write_record<W: Write + ?Sized>(writer: &mut W, header: &str, seq: &[u8], qual: &[u8]) -> io::Result<()> {
    writer.write_all(b"@")?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(seq)?;
    writer.write_all(b"\n+")?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(qual)?;
    writer.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_lengths() {
        assert!(Read::new("r1", "ACGT", "IIII").is_ok());
        let err = Read::new("r1", "ACGT", "III").unwrap_err();
        assert_eq!(err.read_id, "r1");
    }

    #[test]
    fn test_add_reverse() {
        let mut read = Read::new("r1/1", "ACGT", "IIII").unwrap();
        assert!(!read.is_paired());

        read.add_reverse("r1/2", "TTGCA", "IIIII").unwrap();
        assert!(read.is_paired());
        assert_eq!(read.reverse_seq(), Some(&b"TTGCA"[..]));

        // A second mate is rejected
        assert!(read.add_reverse("r1/2", "TT", "II").is_err());
    }

    #[test]
    fn test_add_reverse_validates_lengths() {
        let mut read = Read::new("r1", "ACGT", "IIII").unwrap();
        assert!(read.add_reverse("r1", "ACGT", "II").is_err());
        assert!(!read.is_paired());
    }

    #[test]
    fn test_fastq_round_trip() {
        let record = "@read1 1:N:0:ACGT\nACGTACGT\n+read1 1:N:0:ACGT\nIIIIHHHH\n";
        let read = Read::new("read1 1:N:0:ACGT", "ACGTACGT", "IIIIHHHH").unwrap();
        assert_eq!(read.to_fastq(), record);
    }

    #[test]
    fn test_bare_separator_is_written_with_header() {
        let mut collection = crate::parsing::fastq::ReadCollection::default();
        collection
            .add_forward(seq_io::fastq::Reader::new(&b"@r1\nACGT\n+\nIIII\n"[..]), "fwd")
            .unwrap();
        assert_eq!(collection.reads()[0].to_fastq(), "@r1\nACGT\n+r1\nIIII\n");
    }

    #[test]
    fn test_write_reverse() {
        let mut read = Read::new("r1/1", "ACGT", "IIII").unwrap();
        let mut out = Vec::new();
        read.write_reverse(&mut out).unwrap();
        assert!(out.is_empty());

        read.add_reverse("r1/2", "GG", "##").unwrap();
        read.write_reverse(&mut out).unwrap();
        assert_eq!(out, b"@r1/2\nGG\n+r1/2\n##\n");
    }

    #[test]
    fn test_trim_prefix() {
        let mut read = Read::new("r1", "ACGTAAAA", "12345678").unwrap();
        read.add_reverse("r1", "GGCC", "abcd").unwrap();
        read.trim_prefix(4, Some(2));
        assert_eq!(read.seq(), b"AAAA");
        assert_eq!(read.qual(), b"5678");
        let mate = read.reverse().unwrap();
        assert_eq!(mate.seq, b"CC");
        assert_eq!(mate.qual, b"cd");

        read.trim_prefix(100, None);
        assert!(read.seq().is_empty());
        assert!(read.qual().is_empty());
    }

    #[test]
    fn test_read_name() {
        assert_eq!(read_name("abc"), "abc");
        assert_eq!(read_name("abc/1"), "abc");
        assert_eq!(read_name("abc/2 comment"), "abc");
        assert_eq!(read_name("abc 1:N:0"), "abc");
        assert_eq!(read_name("abc/3"), "abc/3");
    }
}
