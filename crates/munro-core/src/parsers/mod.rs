pub mod munrotab;
