use crate::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A count register followed by that many element registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArraySpec {
    pub count_address: RegisterAddress,
    /// Element `n` (1-indexed) lives at `element_base + n`.
    pub element_base: RegisterAddress,
    pub element: Encoding,
}

impl ArraySpec {
    /// The common layout where elements follow the count register directly.
    pub const fn at(address: RegisterAddress, element: Encoding) -> Self {
        Self {
            count_address: address,
            element_base: address,
            element,
        }
    }
}

/// Per-cell readings keyed `cell_1..cell_n` in register order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellArray {
    cells: Vec<Value>,
}

impl CellArray {
    pub fn name(index: usize) -> String {
        format!("cell_{}", index + 1)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index: usize = name.strip_prefix("cell_")?.parse().ok()?;
        self.cells.get(index.checked_sub(1)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, &Value)> {
        self.cells.iter().enumerate().map(|(i, v)| (Self::name(i), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for CellArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(&name, value)?;
        }
        map.end()
    }
}

/// Reads the element count, then each element on its own.
///
/// Any failed element read fails the whole array; a gap would make the
/// indices of later cells ambiguous.
pub fn decode_array<C: RegisterClient + ?Sized>(client: &mut C, spec: &ArraySpec) -> Result<CellArray> {
    let count = client.read_word(spec.count_address)?;
    trace!("array at {} holds {} elements", spec.count_address, count);

    let cells = (1..=count)
        .map(|n| {
            let address = spec
                .element_base
                .checked_add(n)
                .ok_or(DecodeError::AddressOverflow {
                    address: spec.element_base,
                    count: usize::from(count) + 1,
                })?;
            client
                .read_scalar(address, spec.element)
                .map(|raw| Value::scaled(raw, spec.element))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CellArray { cells })
}

/// Names `cell_1..cell_n` for the count currently held at `count_address`.
pub fn cell_names<C: RegisterClient + ?Sized>(
    client: &mut C,
    count_address: RegisterAddress,
) -> Result<Vec<String>> {
    let count = client.read_word(count_address)?;
    Ok((0..usize::from(count)).map(CellArray::name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RegisterImage;

    #[test]
    fn empty_array_issues_no_element_reads() {
        let mut image = RegisterImage::new();
        image.set_word(100, 0);

        let cells = decode_array(&mut image, &ArraySpec::at(100, Encoding::unsigned(0))).unwrap();
        assert!(cells.is_empty());
        assert_eq!(image.requests(), &[(100, 1)]);
    }

    #[test]
    fn elements_follow_count_in_order() {
        let mut image = RegisterImage::new();
        image.set_words(100, &[3, 10, 20, 30]);

        let cells = decode_array(&mut image, &ArraySpec::at(100, Encoding::unsigned(0))).unwrap();
        assert_eq!(
            serde_json::to_string(&cells).unwrap(),
            r#"{"cell_1":10,"cell_2":20,"cell_3":30}"#
        );
        assert_eq!(image.requests(), &[(100, 1), (101, 1), (102, 1), (103, 1)]);
    }

    #[test]
    fn separate_element_base() {
        let mut image = RegisterImage::new();
        image.set_word(5, 2);
        image.set_words(201, &[0xFFFF, 25]);

        let spec = ArraySpec {
            count_address: 5,
            element_base: 200,
            element: Encoding::signed(1),
        };
        let cells = decode_array(&mut image, &spec).unwrap();
        assert_eq!(cells.get("cell_1"), Some(&Value::Number(-0.1)));
        assert_eq!(cells.get("cell_2"), Some(&Value::Number(2.5)));
        assert_eq!(cells.get("cell_3"), None);
        assert_eq!(cells.get("cell_0"), None);
    }

    #[test]
    fn failed_element_fails_array() {
        let mut image = RegisterImage::new();
        image.set_words(100, &[3, 10, 20]);

        let err = decode_array(&mut image, &ArraySpec::at(100, Encoding::unsigned(0))).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::NoResponse { address: 103 })
        ));
    }

    #[test]
    fn count_past_register_space_is_a_decode_error() {
        let mut image = RegisterImage::new();
        image.set_words(0xFFFD, &[3, 1, 2]);

        let err = decode_array(&mut image, &ArraySpec::at(0xFFFD, Encoding::unsigned(0))).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::AddressOverflow { address: 0xFFFD, count: 4 })
        ));
        assert_eq!(image.requests(), &[(0xFFFD, 1), (0xFFFE, 1), (0xFFFF, 1)]);
    }

    #[test]
    fn names_track_count() {
        let mut image = RegisterImage::new();
        image.set_word(7, 2);
        assert_eq!(cell_names(&mut image, 7).unwrap(), vec!["cell_1", "cell_2"]);
    }
}
