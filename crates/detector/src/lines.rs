//! 바이트 단위 라인 리더
//!
//! 로그는 공격자가 내용을 통제하는 입력입니다. `BufRead::lines`는 UTF-8이 아닌
//! 바이트 하나에서 에러를 반환해 이후 라인을 읽지 못하므로, 여기서는 잘못된
//! 바이트를 U+FFFD로 치환하고 경고만 남긴 뒤 계속 읽습니다.
//! 실제 읽기 실패만 에러로 반환됩니다.

use std::borrow::Cow;
use std::io::{self, BufRead};

use tracing::warn;

/// [`lossy_lines`]가 반환하는 반복자
#[derive(Debug)]
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
}

/// 리더를 라인 단위로 읽습니다.
///
/// 줄 끝의 `\n`과 `\r\n`은 제거됩니다. UTF-8이 아닌 바이트는 치환되고
/// 해당 라인 번호와 함께 warn 레코드가 남습니다.
pub fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
        line_number: 0,
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }

                let line = match String::from_utf8_lossy(&self.buf) {
                    Cow::Borrowed(s) => s.to_owned(),
                    Cow::Owned(s) => {
                        warn!(
                            line = self.line_number,
                            "line is not valid UTF-8, invalid bytes replaced"
                        );
                        s
                    }
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
