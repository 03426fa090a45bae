pub mod fetcher;

pub use fetcher::PoolStateFetcher;
