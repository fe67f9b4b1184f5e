mod backend_client;
mod ipc_tests;
mod realtime;
