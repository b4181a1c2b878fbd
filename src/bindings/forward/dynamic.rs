/*!
Resources that are dynamic.  That is, they change frequently.

Each one is multibuffered: the CPU writes one copy while the GPU reads another, and fences decide
when a copy may change hands.
*/
pub mod texture_stream;
