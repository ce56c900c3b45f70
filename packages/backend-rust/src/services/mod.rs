pub mod extraction;
pub mod ocr;
pub mod pos_tagger;
pub mod tokenizer;
pub mod translator;
pub mod upload;
pub mod word_filter;
