pub mod body_reader;
pub mod buffers;
pub mod chunked_reader;
pub mod headers;
pub mod length_reader;
pub mod response;

pub use self::body_reader::BodyReader;
pub use self::chunked_reader::ChunkedReader;
pub use self::headers::HeaderList;
pub use self::length_reader::LengthReader;
pub use self::response::{parse_response, parse_response_head, Response, ResponseHead};
