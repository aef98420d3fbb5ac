pub mod mock_mgmt_server;
