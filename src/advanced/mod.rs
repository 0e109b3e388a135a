pub mod async_reader;
