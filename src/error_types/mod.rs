pub mod partfile;
