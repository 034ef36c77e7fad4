pub mod auction_repo;
