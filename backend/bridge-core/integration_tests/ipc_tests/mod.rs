mod helpers;
mod ipc;
mod ws_invoker;
