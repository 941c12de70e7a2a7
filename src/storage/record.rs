use crate::types::{
    RowId, SerialTag,
    error::DatabaseError,
    page::Page,
    serial::SerialType,
    value::ColumnValue,
    varint,
};

/// One decoded table leaf cell.
///
/// Layout: `[varint payload_size][varint row_id][payload]` where the payload is a record
/// header (`[varint header_size][varint serial_type]*`) followed by the packed column bodies.
#[derive(Debug, Clone)]
pub struct Record {
    pub row_id: RowId,
    pub serial_tags: Vec<SerialTag>,
    payload: Vec<u8>,
    body_offset: usize,
}

impl Record {
    /// Decode the leaf cell starting at page-relative `offset` of `page`.
    pub fn from_leaf_cell(page: &Page, offset: usize) -> Result<Self, DatabaseError> {
        let malformed = |reason: String| DatabaseError::MalformedCell {
            offset: offset as u64,
            reason,
        };
        let data = &page.data;

        let payload_size = varint::decode(data, offset);
        if payload_size.len == 0 || payload_size.value < 0 {
            return Err(malformed("Missing payload size".to_string()));
        }
        let row_id = varint::decode(data, offset + payload_size.len);
        if row_id.len == 0 {
            return Err(malformed("Missing row id".to_string()));
        }

        let payload_start = offset + payload_size.len + row_id.len;
        let payload_end = payload_start + payload_size.value as usize;
        if payload_end > data.len() {
            return Err(malformed(format!(
                "Payload of {} bytes runs past the end of page {}",
                payload_size.value, page.number
            )));
        }

        Self::from_payload(row_id.value, data[payload_start..payload_end].to_vec())
            .map_err(malformed)
    }

    /// Decode a record from its full payload (header + body).
    pub fn from_payload(row_id: RowId, payload: Vec<u8>) -> Result<Self, String> {
        let header_size = varint::decode(&payload, 0);
        if header_size.len == 0 {
            return Err("Empty record".to_string());
        }
        let header_end = header_size.value;
        if header_end < header_size.len as i64 || header_end as u64 > payload.len() as u64 {
            return Err(format!(
                "Record header size {} outside payload of {} bytes",
                header_end,
                payload.len()
            ));
        }
        let header_end = header_end as usize;

        let mut serial_tags = Vec::new();
        let mut cursor = header_size.len;
        while cursor < header_end {
            let tag = varint::decode(&payload[..header_end], cursor);
            if tag.len == 0 {
                break;
            }
            serial_tags.push(tag.value);
            cursor += tag.len;
        }

        Ok(Self {
            row_id,
            serial_tags,
            payload,
            body_offset: header_end,
        })
    }

    pub fn column_count(&self) -> usize {
        self.serial_tags.len()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Offset of the first column body byte within the payload.
    pub fn body_offset(&self) -> usize {
        self.body_offset
    }

    /// Lazily decode the columns in header order.
    pub fn values(&self) -> RecordValues<'_> {
        RecordValues {
            record: self,
            column: 0,
            offset: self.body_offset,
        }
    }

    pub fn value(&self, index: usize) -> Option<ColumnValue> {
        self.values().nth(index)
    }

    pub fn serial_type(&self, index: usize) -> Option<SerialType> {
        self.serial_tags.get(index).copied().map(SerialType::from_tag)
    }
}

/// Iterator over the decoded columns of a [`Record`].
pub struct RecordValues<'a> {
    record: &'a Record,
    column: usize,
    offset: usize,
}

impl Iterator for RecordValues<'_> {
    type Item = ColumnValue;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = *self.record.serial_tags.get(self.column)?;
        let serial_type = SerialType::from_tag(tag);
        let body = self.record.payload.get(self.offset..).unwrap_or(&[]);
        let value = serial_type.decode(body);

        self.column += 1;
        // Declared widths come from the file and may sum past usize::MAX.
        self.offset = self.offset.saturating_add(serial_type.size());
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.record.serial_tags.len() - self.column;
        (remaining, Some(remaining))
    }

    // Skipped columns only need their widths, not a decode.
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        for _ in 0..n {
            let tag = *self.record.serial_tags.get(self.column)?;
            self.offset = self.offset.saturating_add(SerialType::from_tag(tag).size());
            self.column += 1;
        }
        self.next()
    }
}
