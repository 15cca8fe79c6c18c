//! The message composer: holds the file picked for upload and the transient
//! error notices raised while picking it.

use super::ChatError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
  pub name: String,
  pub bytes: Vec<u8>,
}

impl SelectedFile {
  pub fn size(&self) -> usize {
    self.bytes.len()
  }
}

#[derive(Debug)]
pub struct Composer {
  max_bytes: usize,
  pub file: Option<SelectedFile>,
  notices: Vec<String>,
}

impl Composer {
  pub fn new(max_bytes: usize) -> Self {
    Self { max_bytes, file: None, notices: Vec::new() }
  }

  /// Oversized files are refused with one error notice and leave `file` empty.
  pub fn select_file(&mut self, file: SelectedFile) -> bool {
    if file.size() > self.max_bytes {
      self.file = None;
      self.notices.push(ChatError::FileTooLarge { size: file.size(), max: self.max_bytes }.to_string());
      return false;
    }
    self.file = Some(file);
    true
  }

  pub fn take_file(&mut self) -> Option<SelectedFile> {
    self.file.take()
  }

  pub fn notices(&self) -> &[String] {
    &self.notices
  }
}
