/// WriteBatch collects writes and the preconditions they depend on, so that
/// a multi-record change can be validated first and applied in one
/// transaction afterwards.
///
/// Preconditions compare the raw stored bytes: `expect(key, Some(bytes))`
/// requires the key to still hold exactly `bytes`, `expect_absent(key)`
/// requires the key to be missing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    expectations: Vec<(String, Option<Vec<u8>>)>,
    puts: Vec<(String, Vec<u8>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to hold `value` (or be absent for `None`) at commit time.
    pub fn expect(&mut self, key: impl Into<String>, value: Option<Vec<u8>>) -> &mut Self {
        self.expectations.push((key.into(), value));
        self
    }

    pub fn expect_absent(&mut self, key: impl Into<String>) -> &mut Self {
        self.expect(key, None)
    }

    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.puts.push((key.into(), value));
        self
    }

    pub fn expectations(&self) -> &[(String, Option<Vec<u8>>)] {
        &self.expectations
    }

    pub fn puts(&self) -> &[(String, Vec<u8>)] {
        &self.puts
    }

    /// Number of writes. Preconditions are not counted.
    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
